use thiserror::Error;

/// Crate-wide error type.
/// Every module keeps its own error enum; this one folds them together with the
/// third-party errors that can surface while reading a workbook.
#[derive(Error, Debug)]
pub enum PolicySheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Policy module errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    ExtractError(#[from] crate::policy::extractor::ExtractError),

    #[error("{0}")]
    EmitError(#[from] crate::policy::emitter::EmitError),

    #[error("{0}")]
    ParseError(#[from] crate::pipeline::ParseError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, PolicySheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| PolicySheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
