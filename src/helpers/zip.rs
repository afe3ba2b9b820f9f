//! The ZIP package behind XLSX and ODS files.
use crate::error::PolicySheetError;
use crate::helpers::xml::XmlReader;
use crate::spreadsheet::SpreadsheetError;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::ZipArchive;

/// Part lookups inside a workbook package.
///
/// Part names are matched ignoring ASCII case and with `\` read as `/`,
/// since writers disagree on both.
pub(crate) struct Package<RS: Read + Seek> {
    archive: ZipArchive<RS>,
}

impl<RS: Read + Seek> Package<RS> {
    pub(crate) fn new(source: RS) -> Result<Self, PolicySheetError> {
        Ok(Self {
            archive: ZipArchive::new(source)?,
        })
    }

    /// Name under which `part` is stored, if present
    fn stored_name(&self, part: &str) -> Option<String> {
        let wanted = part.replace('\\', "/");
        self.archive
            .file_names()
            .find(|stored| stored.replace('\\', "/").eq_ignore_ascii_case(&wanted))
            .map(str::to_owned)
    }

    /// Whole contents of a part
    pub(crate) fn read(&mut self, part: &str) -> Result<Option<Vec<u8>>, PolicySheetError> {
        let Some(stored) = self.stored_name(part) else {
            return Ok(None);
        };
        let mut contents = Vec::new();
        self.archive.by_name(&stored)?.read_to_end(&mut contents)?;
        Ok(Some(contents))
    }

    /// Streams an XML part
    pub(crate) fn xml(&mut self, part: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, PolicySheetError> {
        match self.stored_name(part) {
            Some(stored) => Ok(Some(XmlReader::new(BufReader::new(self.archive.by_name(&stored)?)))),
            None => Ok(None),
        }
    }

    /// Streams an XML part the workbook cannot do without
    pub(crate) fn required_xml(&mut self, part: &str) -> Result<XmlReader<BufReader<ZipFile<'_, RS>>>, PolicySheetError> {
        match self.xml(part)? {
            Some(reader) => Ok(reader),
            None => Err(SpreadsheetError::FileError(part.to_owned()).into()),
        }
    }
}
