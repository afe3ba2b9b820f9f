//! # Policy Module
//!
//! Turns a worksheet grid into policy records:
//!
//! - [`extractor`] locates the action table and the binding tables in the grid
//! - [`synthesizer`] builds one [`Policy`] per (role column, resource) pair
//! - [`warning`] collects the recoverable anomalies met on the way
//! - [`emitter`] serializes records and writes them out
use serde::Serialize;

pub mod emitter;
pub mod extractor;
pub mod synthesizer;
pub mod warning;

/// The only effect a synthesized policy carries.
pub const EFFECT_ALLOW: &str = "allow";

/// Conditions are never produced; serializes as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Conditions {}

/// An allow-rule for one (role, resource) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub name: String,
    pub description: String,
    pub subjects: Vec<String>,
    pub actions: Vec<String>,
    pub effect: String,
    pub conditions: Conditions,
    pub resources: Vec<String>,
    /// Stem of the output file, before sanitizing
    #[serde(skip)]
    pub file_name: String,
}
