//! Display helpers for reviewing a near-duplicate group.
//!
//! Nothing here returns a password, OTP value or full note.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::Record;

pub const NOTES_PREVIEW_LEN: usize = 60;

/// Extension key holding a provider-specific container name.
pub const VAULT_KEY: &str = "proton_vault";

pub const NO_DIFFERENCES: &str = "no differences vs best";

/// Length-only rendering of a secret.
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        format!("******** (len={})", value.chars().count())
    }
}

/// Trimmed notes cut to [`NOTES_PREVIEW_LEN`] characters.
pub fn preview_notes(notes: &str) -> String {
    let stripped = notes.trim();
    if stripped.is_empty() {
        return "(empty)".to_string();
    }
    if stripped.chars().count() <= NOTES_PREVIEW_LEN {
        return stripped.to_string();
    }
    let head: String = stripped.chars().take(NOTES_PREVIEW_LEN - 3).collect();
    format!("{head}... (truncated)")
}

/// For each record, short labels describing how it differs from `group[best]`.
pub fn diff_flags(group: &[Record], best: usize) -> Vec<Vec<&'static str>> {
    let Some(best) = group.get(best) else {
        return vec![Vec::new(); group.len()];
    };

    group
        .iter()
        .map(|item| {
            let mut flags = Vec::new();
            if item.title != best.title {
                flags.push("title");
            }
            if item.notes.trim() != best.notes.trim() {
                flags.push("notes");
            }
            if item.password != best.password {
                flags.push("password");
            }
            if item.folder != best.folder {
                flags.push("folder");
            }
            if item.extra.get(VAULT_KEY) != best.extra.get(VAULT_KEY) {
                flags.push("vault");
            }

            let (mine, theirs) = (item.last_touched(), best.last_touched());
            if mine != 0 && theirs != 0 {
                if mine < theirs {
                    flags.push("last changed (older)");
                } else if mine > theirs {
                    flags.push("last changed (newer)");
                }
            }

            if flags.is_empty() {
                flags.push(NO_DIFFERENCES);
            }
            flags
        })
        .collect()
}

/// For each record, the positions of the other records sharing its password.
///
/// Records with an empty password are matched against each other too.
pub fn password_matches(group: &[Record]) -> Vec<Vec<usize>> {
    let mut by_password: HashMap<&str, Vec<usize>> = HashMap::new();
    for (pos, record) in group.iter().enumerate() {
        by_password.entry(record.password.as_str()).or_default().push(pos);
    }

    group
        .iter()
        .enumerate()
        .map(|(pos, record)| {
            by_password
                .get(record.password.as_str())
                .map(|same| same.iter().copied().filter(|&p| p != pos).collect())
                .unwrap_or_default()
        })
        .collect()
}

/// `YYYY-MM-DD HH:MM UTC`, or `(unknown)` for missing or zero timestamps.
pub fn format_timestamp(epoch_ms: Option<i64>) -> String {
    epoch_ms
        .filter(|ms| *ms != 0)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "(unknown)".to_string())
}
