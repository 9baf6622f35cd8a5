use std::collections::BTreeMap;
use std::io::{self, Write};

use tminus_core::{SlotSink, Unit};

/// Prints one line per render, e.g. `days=12 hours=03 minutes=07 seconds=09`,
/// labelling each value with its manifest slot id.
///
/// A render identical to the previous one is not printed again.
pub struct TerminalBoard {
    slots: BTreeMap<Unit, String>,
    values: BTreeMap<Unit, String>,
    last_line: Option<String>,
}

impl TerminalBoard {
    pub fn new(slots: BTreeMap<Unit, String>) -> Self {
        Self {
            slots,
            values: BTreeMap::new(),
            last_line: None,
        }
    }

    fn line(&self) -> String {
        self.values
            .iter()
            .map(|(unit, value)| {
                let label = self.slots.get(unit).map(String::as_str).unwrap_or(unit.as_str());
                format!("{label}={value}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SlotSink for TerminalBoard {
    fn write(&mut self, unit: Unit, value: &str) {
        self.values.insert(unit, value.to_string());
    }

    fn commit(&mut self) {
        let line = self.line();
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "failed to write countdown line");
        }
        self.last_line = Some(line);
    }
}
