use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;

/// A worksheet read from a spreadsheet file, kept as sparse cells.
pub struct Sheet {
    /// Source file name
    pub file_name: String,
    /// Sheet name
    pub name: String,
    /// Non-empty cells in reading order
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Builds a sheet from already materialized rows; empty strings are not stored.
    pub fn from_rows(name: &str, rows: &[Vec<String>]) -> Self {
        let mut sheet = Self::new("", name);
        for (row, cells) in rows.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind: CellType::InlineString,
                        value: value.to_owned(),
                    });
                }
            }
        }
        sheet
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        if cell.kind == CellType::Error {
            tracing::debug!(sheet = %self.name, cell = %cell.reference(), value = %cell.value, "keeping error literal as text");
        }
        if self.row_upper_bound.map(|row| row < cell.row).unwrap_or(true) {
            self.row_upper_bound = Some(cell.row);
        }
        if self.col_upper_bound.map(|col| col < cell.col).unwrap_or(true) {
            self.col_upper_bound = Some(cell.col);
        }
        self.cells.push(cell);
    }

    /// Materializes the sheet as rows of strings.
    ///
    /// Rows run from the first sheet row to the last row holding data, and every
    /// row is padded to the widest used column, so a row without cells comes
    /// out as an all-empty row. Grids read from a workbook are therefore never
    /// ragged, and a truncated-row error can only come from hand-built rows.
    pub fn grid(&self) -> Vec<Vec<String>> {
        let (rows, cols) = match self.row_upper_bound.zip(self.col_upper_bound) {
            Some((row, col)) => (row + 1, col + 1),
            None => return Vec::new(),
        };
        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in &self.cells {
            grid[cell.row][cell.col] = cell.to_string();
        }
        grid
    }
}
