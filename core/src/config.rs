//! Dashboard configuration.
//!
//! Settings come from the environment (optionally seeded from a `.env` file)
//! and are overridden by CLI flags:
//!
//! | Variable                  | Meaning                                |
//! |---------------------------|----------------------------------------|
//! | `PENGUINBOARD_DATA`       | Observation CSV to load                |
//! | `PENGUINBOARD_DELIMITER`  | Force the CSV delimiter (one char)     |
//! | `PENGUINBOARD_SELECTION`  | JSON selection snapshot to start from  |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::RecordStore;
use crate::selection::SelectionState;

pub const DATA_VAR: &str = "PENGUINBOARD_DATA";
pub const DELIMITER_VAR: &str = "PENGUINBOARD_DELIMITER";
pub const SELECTION_VAR: &str = "PENGUINBOARD_SELECTION";

/// Resolved dashboard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Observation CSV to load
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Delimiter override (auto-detect if not set)
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Selection snapshot to use instead of the defaults
    #[serde(default)]
    pub selection_path: Option<PathBuf>,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/palmerpenguins_extended.csv")
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            delimiter: None,
            selection_path: None,
        }
    }
}

impl DashboardConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(DATA_VAR).filter(|v| !v.trim().is_empty()) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(DELIMITER_VAR) {
            config.delimiter = Some(parse_delimiter(&raw).map_err(|message| ConfigError::InvalidValue {
                key: DELIMITER_VAR.to_string(),
                message,
            })?);
        }
        if let Some(path) = lookup(SELECTION_VAR).filter(|v| !v.trim().is_empty()) {
            config.selection_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Apply CLI overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        data_path: Option<&Path>,
        delimiter: Option<char>,
        selection_path: Option<&Path>,
    ) -> Self {
        if let Some(p) = data_path {
            self.data_path = p.to_path_buf();
        }
        if delimiter.is_some() {
            self.delimiter = delimiter;
        }
        if let Some(p) = selection_path {
            self.selection_path = Some(p.to_path_buf());
        }
        self
    }

    /// The configured selection snapshot, or the opening selection for `store`.
    ///
    /// A snapshot without filters checks every value present in `store`.
    pub fn selection(&self, store: &RecordStore) -> ConfigResult<SelectionState> {
        match &self.selection_path {
            Some(path) => Ok(SelectionState::load(path, store)?),
            None => Ok(SelectionState::defaults_for(store)),
        }
    }
}

/// Accept a single character, or `\t` / `tab` for tabs.
pub fn parse_delimiter(raw: &str) -> Result<char, String> {
    match raw {
        "\\t" | "tab" | "TAB" => return Ok('\t'),
        _ => {}
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!("expected a single ASCII character, got '{}'", raw)),
    }
}
