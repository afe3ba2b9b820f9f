//! Office Open XML workbooks (`.xlsx`, `.xlsm`, `.xlam`).
use crate::error::PolicySheetError;
use crate::helpers::xml::StartTagExt;
use crate::helpers::xml::TextRules;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::Package;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_RELATIONSHIP: &str = "/worksheet";

const SHEET: QName = QName(b"sheet");
const RELATIONSHIP: &[u8] = b"Relationship";
const SHARED_STRING: QName = QName(b"si");
const ROW: QName = QName(b"row");
const CELL: QName = QName(b"c");

/// Text of shared strings and cells: `<v>` values and `<t>` runs, without phonetic hints.
const STRING_TEXT: TextRules = TextRules {
    text_in: &[QName(b"t"), QName(b"v")],
    skip: &[QName(b"rPh")],
    line_break: None,
    spaces: None,
};

pub(crate) struct XlsxSpreadsheet<RS: Read + Seek> {
    pub(crate) name: String,
    package: Package<RS>,
    /// (sheet name, worksheet part) in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet<BufReader<File>> {
    pub(crate) fn open(file_name: &str) -> Result<Self, PolicySheetError> {
        Self::from_reader(file_name, BufReader::new(File::open(file_name)?))
    }
}

impl<RS: Read + Seek> XlsxSpreadsheet<RS> {
    pub(crate) fn from_reader(file_name: &str, source: RS) -> Result<Self, PolicySheetError> {
        let mut package = Package::new(source)?;
        let sheets = list_worksheets(&mut package)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        Ok(Self {
            name: file_name.to_owned(),
            package,
            sheets,
        })
    }

    fn shared_strings(&mut self) -> Result<Vec<String>, PolicySheetError> {
        let mut strings = Vec::new();
        if let Some(mut reader) = self.package.xml(SHARED_STRINGS_PART)? {
            match_xml_events!(reader => {
                Event::Start(tag) if tag.name() == SHARED_STRING => {
                    strings.push(reader.read_text_until(SHARED_STRING, &STRING_TEXT)?);
                }
            });
        }
        Ok(strings)
    }
}

impl<RS: Read + Seek> Spreadsheet for XlsxSpreadsheet<RS> {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, PolicySheetError> {
        let shared_strings = self.shared_strings()?;
        let mut sheets = Vec::new();
        for (sheet_name, part) in self.sheets.iter().filter(|(name, _)| criteria.accept(name)) {
            let mut sheet = Sheet::new(&self.name, sheet_name);
            let reader = self.package.required_xml(part)?;
            read_worksheet(reader, &mut sheet, &shared_strings)?;
            tracing::debug!(sheet = %sheet_name, cells = sheet.cells.len(), "read xlsx worksheet");
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Worksheets named in the workbook part, resolved through its relationships
fn list_worksheets<RS: Read + Seek>(package: &mut Package<RS>) -> Result<Vec<(String, String)>, PolicySheetError> {
    let parts = worksheet_parts(package)?;
    let mut reader = package.required_xml(WORKBOOK_PART)?;
    let mut sheets = Vec::new();
    match_xml_events!(reader => {
        Event::Start(tag) if tag.name() == SHEET => {
            let name = tag.attribute("name")?;
            let id = tag.local_attribute("id")?;
            if let Some((name, part)) = name.zip(id.and_then(|id| parts.get(&*id))) {
                sheets.push((name.into_owned(), part.to_owned()));
            }
        }
    });
    Ok(sheets)
}

/// Relationship id to worksheet part
fn worksheet_parts<RS: Read + Seek>(package: &mut Package<RS>) -> Result<HashMap<String, String>, PolicySheetError> {
    let mut reader = package.required_xml(WORKBOOK_RELATIONSHIPS_PART)?;
    let mut parts = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(tag) if tag.local_name().as_ref() == RELATIONSHIP => {
            let is_worksheet = tag.attribute("Type")?
                .map_or(true, |kind| kind.ends_with(WORKSHEET_RELATIONSHIP));
            if let (true, Some(id), Some(target)) = (is_worksheet, tag.attribute("Id")?, tag.attribute("Target")?) {
                parts.insert(id.into_owned(), part_path(&target));
            }
        }
    });
    Ok(parts)
}

/// Relationship targets are relative to `xl/` unless absolute
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None if target.starts_with("xl/") => target.to_owned(),
        None => format!("xl/{}", target),
    }
}

fn cell_type(code: &str) -> CellType {
    match code {
        "s" => CellType::SharedString,
        "inlineStr" | "str" => CellType::InlineString,
        "b" => CellType::Boolean,
        "d" => CellType::IsoDateTime,
        "e" => CellType::Error,
        _ => CellType::Number,
    }
}

/// Pushes every non-empty cell of a worksheet part into `sheet`.
///
/// Positions come from the `r` references; a row or cell without a usable one
/// follows its predecessor.
fn read_worksheet<R: BufRead>(
    mut reader: XmlReader<R>,
    sheet: &mut Sheet,
    shared_strings: &[String],
) -> Result<(), PolicySheetError> {
    let mut next_row = 0usize;
    let mut next_col = 0usize;
    match_xml_events!(reader => {
        Event::Start(tag) if tag.name() == ROW => {
            if let Some(row) = tag.attribute("r")?.and_then(|number| row_to_index(&number)) {
                next_row = row;
            }
            next_col = 0;
        }
        Event::End(tag) if tag.name() == ROW => next_row += 1,
        Event::Start(tag) if tag.name() == CELL => {
            let (row, col) = tag.attribute("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((next_row, next_col));
            let kind = tag.attribute("t")?.map_or(CellType::Number, |code| cell_type(&code));
            next_col = col + 1;
            let text = reader.read_text_until(CELL, &STRING_TEXT)?;
            if text.is_empty() {
                continue;
            }
            let cell = match kind {
                CellType::SharedString => {
                    let value = text
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| shared_strings.get(index))
                        .ok_or_else(|| SpreadsheetError::CellValueError(
                            sheet.file_name.to_owned(),
                            sheet.name.to_owned(),
                            index_to_reference(row, col),
                            text.to_owned(),
                        ))?;
                    Cell { row, col, kind: CellType::InlineString, value: value.to_owned() }
                }
                kind => Cell { row, col, kind, value: text },
            };
            sheet.push(cell);
        }
    });
    Ok(())
}
