//! OpenDocument spreadsheets (`.ods`).
use crate::error::PolicySheetError;
use crate::helpers::xml::StartTagExt;
use crate::helpers::xml::TextRules;
use crate::helpers::zip::Package;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const MIME_TYPE_PART: &str = "mimetype";
const CONTENT_PART: &str = "content.xml";
const MANIFEST_PART: &str = "META-INF/manifest.xml";

const TABLE: QName = QName(b"table:table");
const ROW: QName = QName(b"table:table-row");
const CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged region
const COVERED_CELL: QName = QName(b"table:covered-table-cell");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// Paragraphs become lines, `text:s` a run of spaces, comments are dropped.
const CELL_TEXT: TextRules = TextRules {
    text_in: &[],
    skip: &[QName(b"office:annotation")],
    line_break: Some(QName(b"text:p")),
    spaces: Some((QName(b"text:s"), "text:c")),
};

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("'{0}' is not an OpenDocument spreadsheet")]
    MimeTypeError(String),

    #[error("Table without a name in '{0}'")]
    MissingSheetName(String),
}

pub(crate) struct OdsSpreadsheet<RS: Read + Seek> {
    pub(crate) name: String,
    package: Package<RS>,
}

impl OdsSpreadsheet<BufReader<File>> {
    pub(crate) fn open(file_name: &str) -> Result<Self, PolicySheetError> {
        Self::from_reader(file_name, BufReader::new(File::open(file_name)?))
    }
}

impl<RS: Read + Seek> OdsSpreadsheet<RS> {
    /// Rejects packages of another document type and encrypted packages.
    pub(crate) fn from_reader(file_name: &str, source: RS) -> Result<Self, PolicySheetError> {
        let mut package = Package::new(source)?;
        if package.read(MIME_TYPE_PART)?.is_some_and(|mime| mime != MIME_TYPE) {
            Err(OdsError::MimeTypeError(file_name.to_owned()))?
        }
        if is_encrypted(&mut package)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?
        }
        Ok(Self {
            name: file_name.to_owned(),
            package,
        })
    }
}

impl<RS: Read + Seek> Spreadsheet for OdsSpreadsheet<RS> {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, PolicySheetError> {
        let file_name = self.name.as_str();
        let mut reader = self.package.required_xml(CONTENT_PART)?;
        let mut sheets = Vec::new();
        // None while inside a table the criteria reject
        let mut table = None::<Sheet>;
        let mut row = 0usize;
        let mut rows_repeated = 1usize;
        let mut col = 0usize;
        match_xml_events!(reader => {
            Event::Start(tag) if tag.name() == TABLE => {
                let name = tag.attribute("table:name")?
                    .ok_or_else(|| OdsError::MissingSheetName(file_name.to_owned()))?;
                table = criteria.accept(&name).then(|| Sheet::new(file_name, &name));
                row = 0;
            }
            Event::End(tag) if tag.name() == TABLE => {
                if let Some(sheet) = table.take() {
                    tracing::debug!(sheet = %sheet.name, cells = sheet.cells.len(), "read ods table");
                    sheets.push(sheet);
                }
            }
            Event::Start(tag) if tag.name() == ROW => {
                rows_repeated = tag.parsed_attribute("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(tag) if tag.name() == ROW => row += rows_repeated,
            Event::Start(tag) if tag.name() == CELL || tag.name() == COVERED_CELL => {
                let end = if tag.name() == CELL { CELL } else { COVERED_CELL };
                let cols_repeated = tag.parsed_attribute("table:number-columns-repeated")?.unwrap_or(1usize);
                let typed = typed_value(&tag)?;
                let text = reader.read_text_until(end, &CELL_TEXT)?;
                if let (Some(sheet), Some((kind, value))) = (table.as_mut(), typed) {
                    let value = value.unwrap_or(text);
                    if !value.is_empty() {
                        for cell_row in row..row + rows_repeated {
                            for cell_col in col..col + cols_repeated {
                                sheet.push(Cell { row: cell_row, col: cell_col, kind, value: value.to_owned() });
                            }
                        }
                    }
                }
                col += cols_repeated;
            }
        });
        Ok(sheets)
    }
}

fn attribute_text(tag: &BytesStart, name: &str) -> Result<String, PolicySheetError> {
    Ok(tag.attribute(name)?.map(Cow::into_owned).unwrap_or_default())
}

/// Type of a cell and, unless the value is its text content, the value itself.
/// A cell without `office:value-type` is empty.
fn typed_value(tag: &BytesStart) -> Result<Option<(CellType, Option<String>)>, PolicySheetError> {
    let Some(value_type) = tag.attribute("office:value-type")? else {
        return Ok(None);
    };
    let typed = match value_type.as_ref() {
        "string" => {
            let is_error = tag.attribute("calcext:value-type")?.is_some_and(|kind| kind == "error");
            (if is_error { CellType::Error } else { CellType::InlineString }, None)
        }
        "boolean" => {
            let truthy = tag.attribute("office:boolean-value")?.is_some_and(|flag| flag != "false" && flag != "0");
            (CellType::Boolean, Some(if truthy { "1" } else { "0" }.to_owned()))
        }
        "date" => (CellType::IsoDateTime, Some(attribute_text(tag, "office:date-value")?)),
        "time" => (CellType::IsoDateTime, Some(attribute_text(tag, "office:time-value")?)),
        _ => (CellType::Number, Some(attribute_text(tag, "office:value")?)),
    };
    Ok(Some(typed))
}

/// True when the manifest lists encryption data for any entry
fn is_encrypted<RS: Read + Seek>(package: &mut Package<RS>) -> Result<bool, PolicySheetError> {
    let Some(mut reader) = package.xml(MANIFEST_PART)? else {
        return Ok(false);
    };
    match_xml_events!(reader => {
        Event::Start(tag) if tag.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}
