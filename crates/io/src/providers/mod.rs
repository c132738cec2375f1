//! Built-in provider adapters.
//!
//! Each adapter is a stateless row <-> record translator for one export
//! format. [`builtin_registry`] registers all of them in detection tie-break
//! order.

mod apple_passwords;
mod bitwarden;
mod chromium_browser;
mod dashlane;
mod firefox;
mod kaspersky;
mod lastpass;
mod nordpass;
mod protonpass;
mod roboform;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};

use creddedupe_engine::model::{is_engine_key, EMAIL_KEY};
use creddedupe_engine::provider::row_value;
use creddedupe_engine::{EngineError, ProviderFormat, ProviderRegistry, Record, Row};

pub use apple_passwords::ApplePasswordsAdapter;
pub use bitwarden::BitwardenAdapter;
pub use chromium_browser::ChromiumBrowserAdapter;
pub use dashlane::DashlaneAdapter;
pub use firefox::FirefoxAdapter;
pub use kaspersky::KasperskyAdapter;
pub use lastpass::LastpassAdapter;
pub use nordpass::NordpassAdapter;
pub use protonpass::ProtonpassAdapter;
pub use roboform::RoboformAdapter;

/// Registry holding every built-in adapter.
pub fn builtin_registry() -> Result<ProviderRegistry, EngineError> {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(ProtonpassAdapter))?;
    registry.register(Box::new(LastpassAdapter))?;
    registry.register(Box::new(BitwardenAdapter))?;
    registry.register(Box::new(DashlaneAdapter))?;
    registry.register(Box::new(RoboformAdapter))?;
    registry.register(Box::new(NordpassAdapter))?;
    registry.register(Box::new(ApplePasswordsAdapter))?;
    registry.register(Box::new(KasperskyAdapter))?;
    registry.register(Box::new(FirefoxAdapter))?;
    registry.register(Box::new(ChromiumBrowserAdapter))?;
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Shared mapping helpers
// ---------------------------------------------------------------------------

/// Fresh record stamped with its source format.
fn sourced(format: ProviderFormat) -> Record {
    let mut record = Record::default();
    record.provenance.source = Some(format.to_string());
    record
}

/// Columns not consumed by the adapter, for the extension map.
/// Engine annotation columns are never imported.
fn unmapped(row: &Row, mapped: &[&str]) -> BTreeMap<String, String> {
    row.iter()
        .filter(|(k, _)| !mapped.contains(&k.as_str()) && !is_engine_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Split a TOTP cell into (uri, secret).
fn split_otp(raw: &str) -> (Option<String>, Option<String>) {
    let raw = raw.trim();
    if raw.is_empty() {
        (None, None)
    } else if raw.starts_with("otpauth://") {
        (Some(raw.to_string()), None)
    } else {
        (None, Some(raw.to_string()))
    }
}

/// The record's OTP as one cell: URI if present, else the raw secret.
fn otp_cell(record: &Record) -> String {
    record
        .otp_uri
        .clone()
        .or_else(|| record.otp_secret.clone())
        .unwrap_or_default()
}

fn flag(row: &Row, key: &str) -> bool {
    matches!(row_value(row, key).trim(), "1" | "true" | "True" | "TRUE")
}

fn flag_cell(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

/// Title for formats that require one: title, else the site.
fn title_or_site(record: &Record) -> String {
    if record.title.is_empty() {
        record.primary_site.clone().unwrap_or_default()
    } else {
        record.title.clone()
    }
}

fn opt_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn extra_cell(record: &Record, key: &str) -> String {
    record.extra.get(key).cloned().unwrap_or_default()
}

fn set_email(record: &mut Record, raw: &str) {
    let email = raw.trim();
    if !email.is_empty() {
        record.extra.insert(EMAIL_KEY.to_string(), email.to_string());
    }
}

/// Epoch seconds, epoch milliseconds, RFC 3339 or `YYYY-MM-DD HH:MM:SS`
/// (UTC) to epoch milliseconds.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<i64>() {
        // 10^11 seconds is year 5138; anything larger is already milliseconds.
        return if n.unsigned_abs() < 100_000_000_000 {
            n.checked_mul(1000)
        } else {
            Some(n)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}
