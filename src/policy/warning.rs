//! Recoverable anomalies met while extracting and synthesizing a worksheet.
use std::collections::BTreeSet;
use std::fmt::Display;

/// One anomaly, identified by its kind and location.
///
/// Equal warnings collapse, so a missing binding is reported once per role
/// header and an unknown resource once per row.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Warning {
    /// Row 0 lacks a label; the worksheet is skipped
    HeadersNotFound { resource: String, name: String },
    /// The action table has a header but no data rows
    EmptyActionTable,
    /// 1-based position of the role column inside the role span
    EmptyRoleHeader { position: usize },
    /// No binding row for this (lower-cased) role header
    MissingBinding { role: String },
    /// 1-based sheet row with an empty resource piece
    EmptyResource { row: usize },
    /// Resource key absent from the registry
    UnknownResource { resource: String, row: usize },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::HeadersNotFound { resource, name } => {
                write!(f, "cannot find <i>{}</i>, <i>{}</i> or bounds for roles", resource, name)
            }
            Warning::EmptyActionTable => write!(f, "action table is empty"),
            Warning::EmptyRoleHeader { position } => {
                write!(f, "find empty role-header on {}-th position", position)
            }
            Warning::MissingBinding { role } => write!(f, "cannot find binding name for '{}'", role),
            Warning::EmptyResource { row } => write!(f, "found empty page-field on row {}", row),
            Warning::UnknownResource { resource, row } => {
                write!(f, "page '{}' (row {}) isn't in config file: skipped", resource, row)
            }
        }
    }
}

/// Deduplicated warnings of one worksheet, iterated in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Warnings {
    items: BTreeSet<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning; returns false if an equal one was already present
    pub fn push(&mut self, warning: Warning) -> bool {
        self.items.insert(warning)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.items.iter().map(Warning::to_string).collect()
    }

    /// Renders `<b>sheet</b>: message<br>` for every warning.
    pub fn to_html(&self, sheet: &str) -> String {
        self.items
            .iter()
            .map(|warning| format!("<b>{}</b>: {}<br>", sheet, warning))
            .collect()
    }
}

impl FromIterator<Warning> for Warnings {
    fn from_iter<T: IntoIterator<Item = Warning>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_messages() {
        assert_eq!(Warning::EmptyActionTable.to_string(), "action table is empty");
        assert_eq!(
            Warning::EmptyRoleHeader { position: 1 }.to_string(),
            "find empty role-header on 1-th position"
        );
        assert_eq!(
            Warning::MissingBinding { role: "admin".to_owned() }.to_string(),
            "cannot find binding name for 'admin'"
        );
        assert_eq!(Warning::EmptyResource { row: 4 }.to_string(), "found empty page-field on row 4");
        assert_eq!(
            Warning::UnknownResource { resource: "home".to_owned(), row: 2 }.to_string(),
            "page 'home' (row 2) isn't in config file: skipped"
        );
        assert_eq!(
            Warning::HeadersNotFound { resource: "Page".to_owned(), name: "Name".to_owned() }.to_string(),
            "cannot find <i>Page</i>, <i>Name</i> or bounds for roles"
        );
    }

    #[test]
    fn collapses_equal_warnings() {
        let mut warnings = Warnings::new();
        assert!(warnings.push(Warning::MissingBinding { role: "admin".to_owned() }));
        assert!(!warnings.push(Warning::MissingBinding { role: "admin".to_owned() }));
        assert!(warnings.push(Warning::UnknownResource { resource: "home".to_owned(), row: 2 }));
        assert!(warnings.push(Warning::UnknownResource { resource: "home".to_owned(), row: 3 }));
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn renders_html_fragment() {
        let warnings: Warnings = [Warning::EmptyActionTable, Warning::EmptyResource { row: 2 }]
            .into_iter()
            .collect();
        assert_eq!(
            warnings.to_html("Admin"),
            "<b>Admin</b>: action table is empty<br><b>Admin</b>: found empty page-field on row 2<br>"
        );
    }
}
