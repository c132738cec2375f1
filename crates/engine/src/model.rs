use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Extension-map keys
// ---------------------------------------------------------------------------

/// Shared extension key for an email column that is not the username.
pub const EMAIL_KEY: &str = "email";

/// Set on a survivor: the near-duplicate group it won.
pub const GROUP_INDEX_KEY: &str = "dedupe_group_index";

/// Set on a survivor: comma-separated identifiers of every record it replaces.
pub const MERGED_FROM_KEY: &str = "dedupe_merged_from_internal_ids";

/// Set on a discarded record: the near-duplicate group it lost in.
pub const DISCARD_GROUP_KEY: &str = "dedupe_manual_discard_group_index";

/// Extension keys only the engine may write.
pub const ENGINE_KEYS: [&str; 3] = [GROUP_INDEX_KEY, MERGED_FROM_KEY, DISCARD_GROUP_KEY];

pub fn is_engine_key(key: &str) -> bool {
    ENGINE_KEYS.contains(&key)
}

// ---------------------------------------------------------------------------
// Kind + identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Login,
    Note,
    Card,
    Identity,
    Other,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Note => "note",
            Self::Card => "card",
            Self::Identity => "identity",
            Self::Other => "other",
        }
    }

    /// Lenient parse of a provider's type column. Unknown values map to `Other`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "login" => Self::Login,
            "note" => Self::Note,
            "card" => Self::Card,
            "identity" => Self::Identity,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable internal identifier. Assigned once per run and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source format identifier ("bitwarden", "firefox", ...).
    pub source: Option<String>,
    /// Provider-native id (GUID etc.) if the export carries one.
    pub source_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Canonical, provider-agnostic credential entry.
///
/// Adapters build one per input row. After identifiers are assigned the
/// pipeline never mutates a record in place: merge and discard produce
/// annotated clones that replace the originals in the result set.
#[derive(Clone, Default, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub id: Option<RecordId>,
    pub provenance: Provenance,

    pub title: String,
    pub username: String,
    pub password: String,

    pub primary_site: Option<String>,
    pub secondary_sites: Vec<String>,

    pub notes: String,
    pub folder: Option<String>,
    pub tags: BTreeSet<String>,
    pub favorite: bool,

    /// Full `otpauth://` URI.
    pub otp_uri: Option<String>,
    /// Raw shared secret when no URI is available.
    pub otp_secret: Option<String>,

    /// Epoch milliseconds, UTC.
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,

    /// Format-specific data with no canonical home.
    pub extra: BTreeMap<String, String>,
}

// Secrets and notes never reach log output through `{:?}`.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("provenance", &self.provenance)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("primary_site", &self.primary_site)
            .field("secondary_sites", &self.secondary_sites)
            .field("notes", &redacted(&self.notes))
            .field("folder", &self.folder)
            .field("tags", &self.tags)
            .field("favorite", &self.favorite)
            .field("otp_uri", &self.otp_uri.as_deref().map(redacted))
            .field("otp_secret", &self.otp_secret.as_deref().map(redacted))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn redacted(value: &str) -> String {
    if value.is_empty() {
        "(empty)".into()
    } else {
        format!("<redacted len={}>", value.chars().count())
    }
}

impl Record {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn id_str(&self) -> &str {
        self.id.as_ref().map(|id| id.as_str()).unwrap_or("")
    }

    /// Last-modified timestamp, falling back to creation time, then 0.
    pub fn last_touched(&self) -> i64 {
        self.updated_at.or(self.created_at).unwrap_or(0)
    }

    /// Associated email, if the adapter recorded one.
    pub fn email(&self) -> Option<&str> {
        self.extra
            .get(EMAIL_KEY)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Clone with `key` set, replacing any existing value.
    pub fn annotated(&self, key: &str, value: impl Into<String>) -> Record {
        let mut next = self.clone();
        next.extra.insert(key.to_string(), value.into());
        next
    }

    /// Drop engine-owned annotations. Returns how many were removed.
    pub fn strip_engine_keys(&mut self) -> usize {
        let before = self.extra.len();
        self.extra.retain(|key, _| !is_engine_key(key));
        before - self.extra.len()
    }

    /// Identifiers listed under [`MERGED_FROM_KEY`].
    pub fn merged_from(&self) -> Vec<RecordId> {
        self.extra
            .get(MERGED_FROM_KEY)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(RecordId::new)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn group_index(&self) -> Option<usize> {
        self.extra.get(GROUP_INDEX_KEY).and_then(|v| v.trim().parse().ok())
    }

    pub fn discard_group_index(&self) -> Option<usize> {
        self.extra.get(DISCARD_GROUP_KEY).and_then(|v| v.trim().parse().ok())
    }
}

/// Give every record lacking an identifier a fresh `item-N` id.
///
/// Existing identifiers are left alone and never handed out twice.
/// Returns how many ids were assigned.
pub fn assign_ids(records: &mut [Record]) -> usize {
    let mut taken: HashSet<String> = records
        .iter()
        .filter_map(|r| r.id.as_ref().map(|id| id.as_str().to_string()))
        .collect();

    let mut counter = 1usize;
    let mut assigned = 0usize;
    for record in records.iter_mut().filter(|r| r.id.is_none()) {
        let mut candidate = format!("item-{counter}");
        while taken.contains(&candidate) {
            counter += 1;
            candidate = format!("item-{counter}");
        }
        counter += 1;
        taken.insert(candidate.clone());
        record.id = Some(RecordId::new(candidate));
        assigned += 1;
    }
    assigned
}
