//! Label set and resource registry read from the JSON configuration file.
//!
//! ```json
//! {
//!   "page": "Page",
//!   "policy_name": "Name",
//!   "roles_begin": "RoleBegin",
//!   "roles_end": "RoleEnd",
//!   "type": "Type",
//!   "technical_group_name": "Technical group name",
//!   "display_name": "Display name",
//!   "pages_names": { "home": "Home" }
//! }
//! ```
use serde::Deserialize;
use serde::Deserializer;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// File looked up beside the executable when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot find config file: {0}<br>Please, add config file and restart program")]
    Missing(#[source] std::io::Error),

    #[error("corrupted data in config file: {0}<br>Please, fix config and restart program")]
    Corrupted(#[source] serde_json::Error),

    #[error("cannot find location of executable: {0}")]
    ExecutableLocation(#[source] std::io::Error),
}

/// How binding-table rows are paired with role columns.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindingAlignment {
    /// Every role column takes one binding row, including columns skipped for an empty header.
    #[default]
    EveryColumn,
    /// Only role columns with a header take a binding row.
    NamedColumns,
}

/// Header labels matched (case-insensitively) against sheet cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub resource_column: String,
    pub name_column: String,
    pub role_span_start: String,
    pub role_span_end: String,
    pub binding_type: String,
    pub binding_group: String,
    pub binding_display: String,
}

/// Read-only lookup from a lower-case resource key to its display label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceRegistry {
    labels: HashMap<String, String>,
}

impl ResourceRegistry {
    /// Builds the registry, lower-casing keys. An already lower-case key wins over
    /// a differently cased duplicate.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut labels = HashMap::new();
        let mut lower_case_keys = Vec::new();
        for (key, label) in entries {
            let key = key.into();
            let normalized = key.to_lowercase();
            if normalized == key {
                lower_case_keys.push((normalized, label.into()));
            } else {
                labels.entry(normalized).or_insert_with(|| label.into());
            }
        }
        for (key, label) in lower_case_keys {
            labels.insert(key, label);
        }
        Self { labels }
    }

    /// Display label of a normalized (trimmed, lower-case) resource key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Configuration file as written by users.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub page: String,
    /// `pages_names`, keyed by lower-cased resource
    #[serde(rename = "pages_names", default, deserialize_with = "deserialize_registry")]
    registry: ResourceRegistry,
    pub policy_name: String,
    pub roles_begin: String,
    pub roles_end: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub technical_group_name: String,
    pub display_name: String,
    #[serde(default)]
    pub binding_alignment: BindingAlignment,
}

fn deserialize_registry<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResourceRegistry, D::Error> {
    let labels = HashMap::<String, String>::deserialize(deserializer)?;
    Ok(ResourceRegistry::new(labels))
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Corrupted)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Missing)?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.as_ref().display(), pages = config.registry.len(), "loaded config");
        Ok(config)
    }

    /// `config.json` in the directory of the running executable.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let executable = std::env::current_exe().map_err(ConfigError::ExecutableLocation)?;
        let directory = executable.parent().unwrap_or_else(|| Path::new("."));
        Ok(directory.join(DEFAULT_CONFIG_FILE))
    }

    pub fn labels(&self) -> Labels {
        Labels {
            resource_column: self.page.to_owned(),
            name_column: self.policy_name.to_owned(),
            role_span_start: self.roles_begin.to_owned(),
            role_span_end: self.roles_end.to_owned(),
            binding_type: self.kind.to_owned(),
            binding_group: self.technical_group_name.to_owned(),
            binding_display: self.display_name.to_owned(),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}
