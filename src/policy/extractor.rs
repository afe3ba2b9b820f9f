//! Locates the action table and the binding tables inside a worksheet grid.
//!
//! Row 0 carries the headers. The action table runs from row 0 down to the
//! first all-empty row; binding tables are searched for below that row, each
//! introduced by a `type | technical group | display name` marker triple.
use crate::config::Labels;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// Row 0 lacks one of the resource, name, or role-span labels
    #[error("cannot find '{resource}', '{name}' or bounds for roles")]
    HeaderNotFound { resource: String, name: String },

    /// A row is shorter than the last column the action table needs
    #[error("find empty tail of row {row}<br>Please, fix action's table")]
    MalformedRow { row: usize },
}

/// Column positions found in the header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderPositions {
    pub resource: usize,
    pub name: usize,
    /// Columns strictly between the role-span start and end labels
    pub roles: Range<usize>,
}

impl HeaderPositions {
    /// Locates the four labels in `header`, matching case-insensitively.
    /// When a label occurs more than once the right-most occurrence is used.
    pub fn locate(header: &[String], labels: &Labels) -> Result<Self, ExtractError> {
        let mut resource = None;
        let mut name = None;
        let mut roles_begin = None;
        let mut roles_end = None;
        for (col, cell) in header.iter().enumerate() {
            let cell = cell.to_lowercase();
            if cell == labels.resource_column.to_lowercase() {
                resource = Some(col);
            } else if cell == labels.name_column.to_lowercase() {
                name = Some(col);
            } else if cell == labels.role_span_start.to_lowercase() {
                roles_begin = Some(col);
            } else if cell == labels.role_span_end.to_lowercase() {
                roles_end = Some(col);
            }
        }
        match (resource, name, roles_begin, roles_end) {
            (Some(resource), Some(name), Some(begin), Some(end)) => Ok(Self {
                resource,
                name,
                roles: (begin + 1)..end.max(begin + 1),
            }),
            _ => Err(ExtractError::HeaderNotFound {
                resource: labels.resource_column.to_owned(),
                name: labels.name_column.to_owned(),
            }),
        }
    }

    /// Number of role columns
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Highest column index a row must reach
    fn last_column(&self) -> usize {
        let mut last = self.resource.max(self.name);
        if let Some(role) = self.roles.clone().last() {
            last = last.max(role);
        }
        last
    }
}

/// Rows `[resource, action name, role markers...]`; row 0 is the header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionTable {
    pub rows: Vec<Vec<String>>,
}

impl ActionTable {
    /// Row width: resource, action name, then one column per role
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Header row
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when the table holds a header and nothing else
    pub fn has_no_data(&self) -> bool {
        self.rows.len() <= 1
    }
}

/// Result of [`extract_action_table`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedActions {
    pub positions: HeaderPositions,
    pub table: ActionTable,
    /// Index of the first all-empty row, or the row count when there is none
    pub boundary: usize,
}

/// One binding-table row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub group: String,
    /// Colon-delimited path; its last segment is the role short name
    pub subject: String,
    pub description: String,
}

impl Binding {
    pub fn new(group: &str, subject: &str, description: &str) -> Self {
        Self {
            group: group.to_owned(),
            subject: subject.to_owned(),
            description: description.to_owned(),
        }
    }

    /// Last segment of the subject path
    pub fn role(&self) -> &str {
        self.subject.rsplit(':').next().unwrap_or_default()
    }
}

fn is_row_empty(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

/// Extracts the action table.
///
/// Fails with `HeaderNotFound` when row 0 lacks a label and with `MalformedRow`
/// when a table row does not reach the last column it needs.
pub fn extract_action_table(rows: &[Vec<String>], labels: &Labels) -> Result<ExtractedActions, ExtractError> {
    let header = rows.first().map(Vec::as_slice).unwrap_or(&[]);
    let positions = HeaderPositions::locate(header, labels)?;
    let last_column = positions.last_column();

    let mut table = ActionTable::default();
    let mut boundary = rows.len();
    for (index, row) in rows.iter().enumerate() {
        if is_row_empty(row) {
            boundary = index;
            break;
        }
        if row.len() <= last_column {
            return Err(ExtractError::MalformedRow { row: index });
        }
        let mut record = Vec::with_capacity(2 + positions.role_count());
        record.push(row[positions.resource].to_owned());
        record.push(row[positions.name].to_owned());
        record.extend(row.get(positions.roles.clone()).unwrap_or(&[]).iter().cloned());
        table.rows.push(record);
    }
    tracing::debug!(rows = table.rows.len(), roles = positions.role_count(), boundary, "extracted action table");
    Ok(ExtractedActions {
        positions,
        table,
        boundary,
    })
}

/// Collects binding rows from every binding table at or below `start`.
///
/// Tables are read top to bottom; the result keeps their order, which is
/// the order role columns are paired with.
pub fn extract_binding_table(rows: &[Vec<String>], start: usize, labels: &Labels) -> Vec<Binding> {
    let markers = [
        labels.binding_type.to_lowercase(),
        labels.binding_group.to_lowercase(),
        labels.binding_display.to_lowercase(),
    ];
    let mut bindings = Vec::new();
    for index in start..rows.len() {
        let row = &rows[index];
        for col in 0..row.len().saturating_sub(2) {
            let matches = row[col..col + 3]
                .iter()
                .zip(&markers)
                .all(|(cell, marker)| cell.to_lowercase() == *marker);
            if !matches {
                continue;
            }
            tracing::debug!(row = index, col, "found binding table");
            for binding_row in &rows[index + 1..] {
                if binding_row.len() < col + 3 || is_row_empty(&binding_row[col..col + 3]) {
                    break;
                }
                bindings.push(Binding::new(&binding_row[col], &binding_row[col + 1], &binding_row[col + 2]));
            }
        }
    }
    bindings
}
