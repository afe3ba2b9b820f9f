//! Serializes policy records and writes them as JSON files.
use crate::policy::Policy;
use chrono::NaiveDateTime;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Timestamp prefix of per-sheet output directories.
const DIRECTORY_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("cannot marshal policy '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot save json file for policy '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create directory for policies: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A policy ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPolicy {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Output file stem: `:` and `*` become `_`.
pub fn file_stem(policy: &Policy) -> String {
    policy.file_name.replace(&[':', '*'][..], "_")
}

pub fn render(policy: &Policy) -> Result<RenderedPolicy, EmitError> {
    let contents = serde_json::to_vec(policy).map_err(|source| EmitError::Serialize {
        name: policy.name.to_owned(),
        source,
    })?;
    Ok(RenderedPolicy {
        file_name: format!("{}.json", file_stem(policy)),
        contents,
    })
}

/// Writes every policy into `directory`; returns the number of files written.
/// Records sharing a file name overwrite each other, the last one wins.
pub fn write_policies(directory: &Path, policies: &[Policy]) -> Result<usize, EmitError> {
    for policy in policies {
        let rendered = render(policy)?;
        std::fs::write(directory.join(&rendered.file_name), &rendered.contents).map_err(|source| {
            EmitError::Write {
                name: policy.name.to_owned(),
                source,
            }
        })?;
    }
    Ok(policies.len())
}

/// `<root>/<timestamp>_<sheet>`, with path separators in the sheet name replaced.
pub fn output_directory(root: &Path, sheet: &str, now: NaiveDateTime) -> PathBuf {
    let sheet = sheet.replace(&['/', '\\', ':', '*'][..], "_");
    root.join(format!("{}_{}", now.format(DIRECTORY_TIMESTAMP), sheet))
}

/// Creates the directory unless it already exists.
pub fn create_output_directory(path: &Path) -> Result<(), EmitError> {
    std::fs::create_dir_all(path).map_err(|source| EmitError::CreateDirectory {
        path: path.to_owned(),
        source,
    })
}
