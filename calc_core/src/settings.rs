//! # Settings
//!
//! User-tunable behavior, loaded from a JSON file. Every field has a
//! default, so an empty object `{}` is a valid settings file.
//!
//! ```json
//! {
//!   "ledger": { "capacity": 50, "path": "recent.json" },
//!   "format": { "max_decimals": 4 },
//!   "fraction": { "max_exact_digits": 8 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::format::FormatOptions;
use crate::fraction::FractionOptions;
use crate::ledger::{validate_capacity, DEFAULT_LEDGER_CAPACITY};

/// Ledger sizing and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Maximum number of recent conversions kept
    pub capacity: usize,

    /// JSON file for a persistent ledger; `None` keeps it in memory
    pub path: Option<PathBuf>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            capacity: DEFAULT_LEDGER_CAPACITY,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ledger: LedgerSettings,
    pub format: FormatOptions,
    pub fraction: FractionOptions,
}

impl Settings {
    /// Load and validate settings from a JSON file.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CalcError::file_error("read", path.display().to_string(), e.to_string())
        })?;
        let settings = Self::from_json(&contents).map_err(|e| match e {
            CalcError::SerializationError { reason } => CalcError::SerializationError {
                reason: format!("Invalid settings in {}: {}", path.display(), reason),
            },
            other => other,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CalcResult<()> {
        validate_capacity(self.ledger.capacity)?;
        self.format.validate()?;
        self.fraction.validate()?;
        Ok(())
    }
}
