//! Append-only audit trail of dispositions.
//!
//! Entries carry identifiers, group indices and counts only. Serialized keys
//! are sorted at every level: structs declare fields alphabetically and
//! details use a `BTreeMap`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::dedupe::DedupeResult;
use crate::error::EngineError;
use crate::merge::MergeOutcome;
use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AutoRemoveExact,
    ManualMerge,
    ManualDiscard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub details: BTreeMap<String, Value>,
    pub timestamp_ms: i64,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    clock: fn() -> i64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_clock(now_ms)
    }

    /// Use a fixed time source (tests, reproducible output).
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            entries: Vec::new(),
            clock,
        }
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, action: AuditAction, details: BTreeMap<String, Value>) {
        self.entries.push(AuditEntry {
            action,
            details,
            timestamp_ms: (self.clock)(),
        });
    }

    /// One exact cluster. `group_index` is 0-based.
    pub fn record_exact_removal(&mut self, group_index: usize, kept_id: &str, removed_ids: &[&str]) {
        let details = BTreeMap::from([
            ("group_index".to_string(), json!(group_index)),
            ("kept_internal_id".to_string(), json!(kept_id)),
            ("removed_internal_ids".to_string(), json!(removed_ids)),
        ]);
        self.push(AuditAction::AutoRemoveExact, details);
    }

    /// One resolved near-duplicate group. `group_index` is 1-based.
    pub fn record_merge(&mut self, group_index: usize, kept_id: &str, merged_from_ids: &[&str]) {
        let details = BTreeMap::from([
            ("group_index".to_string(), json!(group_index)),
            ("kept_internal_id".to_string(), json!(kept_id)),
            ("merged_from_internal_ids".to_string(), json!(merged_from_ids)),
        ]);
        self.push(AuditAction::ManualMerge, details);
    }

    /// All records discarded from one near-duplicate group.
    pub fn record_discard(&mut self, group_index: usize, discarded_ids: &[&str]) {
        let details = BTreeMap::from([
            ("discarded_internal_ids".to_string(), json!(discarded_ids)),
            ("group_index".to_string(), json!(group_index)),
        ]);
        self.push(AuditAction::ManualDiscard, details);
    }

    /// One entry per exact cluster, in cluster order.
    pub fn record_dedupe(&mut self, result: &DedupeResult) {
        for (index, group) in result.exact_groups.iter().enumerate() {
            let Some((kept, removed)) = group.split_first() else {
                continue;
            };
            if removed.is_empty() {
                continue;
            }
            let removed: Vec<&str> = removed.iter().map(Record::id_str).collect();
            self.record_exact_removal(index, kept.id_str(), &removed);
        }
    }

    /// One merge entry per survivor, then one discard entry per group.
    ///
    /// Reads the annotations left by merge resolution, so records that were
    /// never resolved produce nothing.
    pub fn record_outcome(&mut self, outcome: &MergeOutcome) {
        for survivor in &outcome.survivors {
            let Some(group_index) = survivor.group_index() else {
                continue;
            };
            let sources = survivor.merged_from();
            let mut merged_from: Vec<&str> = sources.iter().map(|id| id.as_str()).collect();
            if merged_from.is_empty() {
                merged_from.push(survivor.id_str());
            }
            self.record_merge(group_index, survivor.id_str(), &merged_from);
        }

        let mut by_group: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for record in &outcome.discarded {
            if let Some(group_index) = record.discard_group_index() {
                by_group.entry(group_index).or_default().push(record.id_str());
            }
        }
        for (group_index, ids) in by_group {
            self.record_discard(group_index, &ids);
        }
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}

/// On-disk audit document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
    pub original_file: String,
    pub original_hash_sha256: String,
    pub output_file: String,
    pub output_hash_sha256: String,
}

impl AuditReport {
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
