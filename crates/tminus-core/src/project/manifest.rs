use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::target::{parse_offset, resolve_target};
use crate::countdown::CountdownOptions;
use crate::delta::Unit;
use crate::error::CoreError;

/// File name looked up in the working directory.
pub const MANIFEST_FILE_NAME: &str = "tminus.json";

/// Widest accepted `pad_width`: the digit count of `u64::MAX`.
pub const MAX_PAD_WIDTH: usize = 20;

fn default_period_ms() -> u64 {
    1000
}

fn default_pad_width() -> usize {
    2
}

fn default_slots() -> BTreeMap<Unit, String> {
    Unit::ALL
        .iter()
        .map(|unit| (*unit, unit.as_str().to_string()))
        .collect()
}

/// Event manifest (tminus.json): one canonical countdown target per event.
///
/// ```json
/// {
///   "name": "Launch week",
///   "target": "2025-10-07T08:00:00",
///   "utc_offset": "-03:00",
///   "slots": { "days": "days", "hours": "hours" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventManifest {
    pub name: String,
    /// Target instant. Read at `utc_offset` when it carries no offset of its
    /// own. Unparseable values are kept and treated as already elapsed.
    pub target: String,
    /// Offset for naive `target` strings, `+HH:MM`. UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Minimum digits per slot.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
    /// Display slot id per unit. Units left out are not rendered.
    #[serde(default = "default_slots")]
    pub slots: BTreeMap<Unit, String>,
}

impl EventManifest {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            utc_offset: None,
            period_ms: default_period_ms(),
            pad_width: default_pad_width(),
            slots: default_slots(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        let manifest: Self = serde_json::from_str(&text).map_err(|e| CoreError::Manifest {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let problem = if manifest.period_ms == 0 {
            Some("period_ms must be positive".to_string())
        } else if manifest.pad_width > MAX_PAD_WIDTH {
            Some(format!("pad_width must be at most {MAX_PAD_WIDTH}"))
        } else if manifest.slots.is_empty() {
            Some("slots must name at least one unit".to_string())
        } else {
            None
        };
        match problem {
            Some(message) => Err(CoreError::Manifest {
                file: path.to_path_buf(),
                message,
            }),
            None => Ok(manifest),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }

    /// The offset naive target strings are read at.
    pub fn offset(&self) -> Result<FixedOffset, CoreError> {
        match self.utc_offset.as_deref() {
            Some(s) => parse_offset(s),
            None => parse_offset("Z"),
        }
    }

    /// The canonical target instant. Only a bad `utc_offset` is an error.
    pub fn target_instant(&self) -> Result<DateTime<Utc>, CoreError> {
        Ok(resolve_target(&self.target, self.offset()?))
    }

    pub fn countdown_options(&self) -> CountdownOptions {
        CountdownOptions {
            period: Duration::from_millis(self.period_ms),
            pad_width: self.pad_width.min(MAX_PAD_WIDTH),
            units: Unit::ALL
                .into_iter()
                .filter(|unit| self.slots.contains_key(unit))
                .collect(),
        }
    }
}
