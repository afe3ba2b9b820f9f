//! A1-style cell references.

/// Columns in a worksheet, `A` through `XFD`.
pub const MAX_COLUMNS: usize = 16_384;

/// Rows in a worksheet.
pub const MAX_ROWS: usize = 1_048_576;

/// Converts a reference like `B3` to a 0-based `(row, col)` pair.
/// Absolute markers (`$B$3`) are accepted; anything else yields `None`.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = col_to_index(letters)?;
    let row = row_to_index(digits)?;
    Some((row, col))
}

/// Converts column letters (`A`, `AB`) to a 0-based index; columns past `XFD` yield `None`.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = letter.to_ascii_uppercase() as usize - 'A' as usize + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > MAX_COLUMNS {
            return None;
        }
    }
    Some(col - 1)
}

/// Converts a 1-based row number to a 0-based index.
pub fn row_to_index(digits: &str) -> Option<usize> {
    let row = digits.parse::<usize>().ok()?;
    if row > MAX_ROWS {
        return None;
    }
    row.checked_sub(1)
}

/// Converts a 0-based `(row, col)` pair to an upper-case reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col + 1;
    let mut letters = Vec::new();
    while column > 0 {
        column -= 1;
        letters.push((b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    let mut reference: String = letters.into_iter().rev().collect();
    reference.push_str(&(row + 1).to_string());
    reference
}
