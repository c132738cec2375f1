//! Provider adapter contract and the per-run registry.
//!
//! Adapters are stateless row <-> record translators. The registry is an
//! explicit value built once per run and passed by reference to detection
//! and export; there is no global instance.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::Record;
use crate::normalize::normalize_header;

/// One CSV row keyed by header text.
pub type Row = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFormat {
    Protonpass,
    Lastpass,
    Bitwarden,
    Dashlane,
    Roboform,
    Nordpass,
    ApplePasswords,
    Kaspersky,
    Firefox,
    ChromiumBrowser,
}

impl ProviderFormat {
    pub const ALL: [ProviderFormat; 10] = [
        Self::Protonpass,
        Self::Lastpass,
        Self::Bitwarden,
        Self::Dashlane,
        Self::Roboform,
        Self::Nordpass,
        Self::ApplePasswords,
        Self::Kaspersky,
        Self::Firefox,
        Self::ChromiumBrowser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protonpass => "protonpass",
            Self::Lastpass => "lastpass",
            Self::Bitwarden => "bitwarden",
            Self::Dashlane => "dashlane",
            Self::Roboform => "roboform",
            Self::Nordpass => "nordpass",
            Self::ApplePasswords => "apple_passwords",
            Self::Kaspersky => "kaspersky",
            Self::Firefox => "firefox",
            Self::ChromiumBrowser => "chromium_browser",
        }
    }
}

impl fmt::Display for ProviderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| EngineError::UnknownProvider(s.trim().to_string()))
    }
}

/// Declared header expectations, used only for format detection.
#[derive(Debug, Clone, Copy)]
pub struct HeaderSchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl HeaderSchema {
    pub fn normalized_required(&self) -> BTreeSet<String> {
        self.required.iter().map(|h| normalize_header(h)).collect()
    }

    pub fn normalized_optional(&self) -> BTreeSet<String> {
        self.optional.iter().map(|h| normalize_header(h)).collect()
    }

    /// Required columns absent from `headers` (compared normalized).
    pub fn missing_required<S: AsRef<str>>(&self, headers: &[S]) -> Vec<String> {
        let present: BTreeSet<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
        self.required
            .iter()
            .filter(|h| !present.contains(&normalize_header(h)))
            .map(|h| h.to_string())
            .collect()
    }
}

/// Format-specific translator between native rows and [`Record`].
pub trait ProviderAdapter: Send + Sync {
    /// Registry key and detection target.
    fn format(&self) -> ProviderFormat;

    fn header_schema(&self) -> HeaderSchema;

    /// Column order used when writing this format. Must be stable.
    fn export_columns(&self) -> &'static [&'static str];

    /// Total: missing fields default to empty, never fails on string input.
    fn import_row(&self, row: &Row) -> Record;

    /// Right inverse of `import_row` for every field the format represents.
    fn export_row(&self, record: &Record) -> Row;
}

/// Value of `key`, or "" when absent.
pub fn row_value<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}

/// Value of `key` when present and non-empty.
pub fn row_opt(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

#[derive(Default)]
pub struct ProviderRegistry {
    adapters: Vec<Box<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter. Enumeration order is registration order, which is
    /// also the detection tie-break order.
    pub fn register(&mut self, adapter: Box<dyn ProviderAdapter>) -> Result<(), EngineError> {
        let format = adapter.format();
        if self.get(format).is_some() {
            return Err(EngineError::DuplicateProvider(format));
        }
        self.adapters.push(adapter);
        Ok(())
    }

    pub fn get(&self, format: ProviderFormat) -> Option<&dyn ProviderAdapter> {
        self.adapters
            .iter()
            .find(|a| a.format() == format)
            .map(|a| a.as_ref())
    }

    pub fn adapters(&self) -> impl Iterator<Item = &dyn ProviderAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    pub fn formats(&self) -> Vec<ProviderFormat> {
        self.adapters.iter().map(|a| a.format()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
