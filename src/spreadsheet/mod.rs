//! # Spreadsheet Reading Module
//!
//! Opens Office Open XML (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument (`.ods`)
//! workbooks and exposes every worksheet as a [`Sheet`] of string cells. The
//! policy extraction works on the materialized grid only and never sees the
//! container format.
use crate::error::PolicySheetError;
use std::path::Path;
use thiserror::Error;

pub(crate) mod cell;
pub mod criteria;
pub(crate) mod ods;
pub mod reference;
pub mod sheet;
pub(crate) mod xlsx;

pub use criteria::Criteria;
pub use sheet::Sheet;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Format of file '{0}' isn't supported")]
    UnsupportedFormat(String),

    #[error("Missing '{0}' in spreadsheet file")]
    FileError(String),

    #[error("Spreadsheet '{0}' has no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: '{3}'")]
    CellValueError(String, String, String, String),
}

/// A workbook that can hand out its worksheets
pub trait Spreadsheet {
    /// File name the workbook was opened from
    fn name(&self) -> String;

    /// Reads every worksheet accepted by `criteria`, in workbook order
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, PolicySheetError>;
}

/// Opens a workbook, choosing the reader by file extension.
pub fn open(file_name: &str) -> Result<Box<dyn Spreadsheet>, PolicySheetError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" => Ok(Box::new(xlsx::XlsxSpreadsheet::open(file_name)?)),
        "ods" => Ok(Box::new(ods::OdsSpreadsheet::open(file_name)?)),
        _ => Err(SpreadsheetError::UnsupportedFormat(file_name.to_owned()))?,
    }
}
