use crate::spreadsheet::reference::index_to_reference;
use std::fmt::Display;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Stored as `1` / `0`
    Boolean,
    Number,
    /// ISO 8601 date/time or duration text
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error literal such as `#N/A`
    Error,
}

/// A single non-empty cell with its position.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CellType::Boolean => {
                let value = self.value == "1" || self.value.eq_ignore_ascii_case("true");
                write!(f, "{}", value)
            }
            CellType::Empty => Ok(()),
            _ => write!(f, "{}", self.value),
        }
    }
}
