//! # Policy Sheet
//!
//! Extracts access-control policies from permission matrices kept in
//! spreadsheets and writes them out as JSON records.
//!
//! ## Worksheet layout
//!
//! - **Header row**: row 0 names a resource ("page") column, an action-name
//!   column, and two sentinel labels enclosing one column per role
//! - **Action table**: rows below the header up to the first empty row; a
//!   resource cell may list several comma-separated resources, and a role
//!   column marks the allowed actions with "yes"
//! - **Binding tables**: below the action table, rows under a
//!   `type | technical group | display name` marker, paired with the role
//!   columns from left to right
//!
//! Every (role column, resource) pair becomes one [`policy::Policy`]. Anomalies
//! that do not break the layout are collected as warnings and returned next to
//! the records.
//!
//! ## Supported formats
//!
//! - Office Open XML workbooks (`.xlsx`, `.xlsm`, `.xlam`)
//! - OpenDocument spreadsheets (`.ods`)
mod helpers;

pub mod config;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod spreadsheet;

pub use config::Config;
pub use error::PolicySheetError;
pub use pipeline::parse;
pub use pipeline::Report;
pub use spreadsheet::Criteria;
