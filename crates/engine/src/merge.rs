//! Near-duplicate merge resolution.
//!
//! Both strategies produce the same shape: a survivor per resolved group
//! (annotated with the group index and every source identifier) plus the
//! discarded losers (annotated with the group index they lost in). Groups
//! kept whole or skipped contribute nothing and can be resolved again later.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::MergeError;
use crate::model::{Record, DISCARD_GROUP_KEY, GROUP_INDEX_KEY, MERGED_FROM_KEY};

// ---------------------------------------------------------------------------
// Best-record heuristic
// ---------------------------------------------------------------------------

/// Number of non-empty core fields.
pub fn completeness(record: &Record) -> usize {
    let opt = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    [
        !record.title.is_empty(),
        !record.username.is_empty(),
        !record.password.is_empty(),
        opt(&record.primary_site),
        !record.notes.is_empty(),
        opt(&record.folder),
        opt(&record.otp_uri),
        opt(&record.otp_secret),
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
}

/// Ranking tuple: newest first, then most complete.
pub fn score_record(record: &Record) -> (i64, usize) {
    (record.last_touched(), completeness(record))
}

/// Position of the highest-scoring record. The first of equal scores wins.
///
/// # Panics
/// On an empty group.
pub fn choose_best(group: &[Record]) -> usize {
    assert!(!group.is_empty(), "choose_best called with an empty group");
    let mut best = 0;
    let mut best_score = score_record(&group[0]);
    for (pos, record) in group.iter().enumerate().skip(1) {
        let score = score_record(record);
        if score > best_score {
            best = pos;
            best_score = score;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Field-level merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeField {
    Title,
    Username,
    Password,
    PrimarySite,
    Notes,
    Folder,
    Favorite,
    OtpUri,
    OtpSecret,
}

impl MergeField {
    pub const ALL: [MergeField; 9] = [
        Self::Title,
        Self::Username,
        Self::Password,
        Self::PrimarySite,
        Self::Notes,
        Self::Folder,
        Self::Favorite,
        Self::OtpUri,
        Self::OtpSecret,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Username => "username",
            Self::Password => "password",
            Self::PrimarySite => "url",
            Self::Notes => "notes",
            Self::Folder => "folder",
            Self::Favorite => "favorite",
            Self::OtpUri => "otp_uri",
            Self::OtpSecret => "otp_secret",
        }
    }

    /// Whether the value is a secret and must only be shown masked.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Password | Self::OtpUri | Self::OtpSecret)
    }
}

impl fmt::Display for MergeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-field source for a two-record merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChoice {
    TakeA,
    TakeB,
    Custom(String),
    /// Leave the field at the first record's value.
    Skip,
}

pub type FieldDecisions = BTreeMap<MergeField, FieldChoice>;

/// Combine two records field by field.
///
/// Unlisted fields, identity and provenance come from `a`. Tags are the
/// union of both; the extension map takes `b`'s value on key conflicts.
pub fn merge_fields(a: &Record, b: &Record, decisions: &FieldDecisions) -> Result<Record, MergeError> {
    let mut merged = a.clone();

    for (field, choice) in decisions {
        let source = match choice {
            FieldChoice::TakeA | FieldChoice::Skip => continue,
            FieldChoice::TakeB => b,
            FieldChoice::Custom(value) => {
                set_custom(&mut merged, *field, value)?;
                continue;
            }
        };
        match field {
            MergeField::Title => merged.title = source.title.clone(),
            MergeField::Username => merged.username = source.username.clone(),
            MergeField::Password => merged.password = source.password.clone(),
            MergeField::PrimarySite => merged.primary_site = source.primary_site.clone(),
            MergeField::Notes => merged.notes = source.notes.clone(),
            MergeField::Folder => merged.folder = source.folder.clone(),
            MergeField::Favorite => merged.favorite = source.favorite,
            MergeField::OtpUri => merged.otp_uri = source.otp_uri.clone(),
            MergeField::OtpSecret => merged.otp_secret = source.otp_secret.clone(),
        }
    }

    merged.tags.extend(b.tags.iter().cloned());
    merged.extra.extend(b.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(merged)
}

fn set_custom(record: &mut Record, field: MergeField, value: &str) -> Result<(), MergeError> {
    let opt = || Some(value.to_string()).filter(|v| !v.is_empty());
    match field {
        MergeField::Title => record.title = value.to_string(),
        MergeField::Username => record.username = value.to_string(),
        MergeField::Password => record.password = value.to_string(),
        MergeField::PrimarySite => record.primary_site = opt(),
        MergeField::Notes => record.notes = value.to_string(),
        MergeField::Folder => record.folder = opt(),
        MergeField::Favorite => record.favorite = parse_bool(value)?,
        MergeField::OtpUri => record.otp_uri = opt(),
        MergeField::OtpSecret => record.otp_secret = opt(),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Group resolution
// ---------------------------------------------------------------------------

/// What to do with one near-duplicate group. Entry positions are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    KeepOne(usize),
    KeepBest,
    /// Different accounts: leave every record as it is.
    KeepAll,
    Skip,
    /// Merge exactly two entries field by field. Other entries are untouched.
    MergeFields {
        first: usize,
        second: usize,
        fields: FieldDecisions,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupResolution {
    pub survivor: Option<Record>,
    pub discarded: Vec<Record>,
}

impl GroupResolution {
    pub fn is_untouched(&self) -> bool {
        self.survivor.is_none() && self.discarded.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub survivors: Vec<Record>,
    pub discarded: Vec<Record>,
    /// 1-based indices of groups left as they were (keep-all, skip, invalid).
    pub untouched_groups: Vec<usize>,
}

impl MergeOutcome {
    fn absorb(&mut self, group_index: usize, resolution: GroupResolution) {
        if resolution.is_untouched() {
            self.untouched_groups.push(group_index);
            return;
        }
        self.survivors.extend(resolution.survivor);
        self.discarded.extend(resolution.discarded);
    }
}

/// Apply `decision` to a group. `group_index` is 1-based.
///
/// Malformed decisions are rejected without side effects.
///
/// # Panics
/// On an empty group. Near-duplicate groups always hold two or more records,
/// so an empty one means the caller built it wrong.
pub fn resolve_group(
    group_index: usize,
    group: &[Record],
    decision: &MergeDecision,
) -> Result<GroupResolution, MergeError> {
    assert!(
        !group.is_empty(),
        "resolve_group called with empty near-duplicate group {group_index}"
    );
    let in_range = |pos: usize| {
        if pos < group.len() {
            Ok(pos)
        } else {
            Err(MergeError::IndexOutOfRange {
                index: pos + 1,
                len: group.len(),
            })
        }
    };

    match decision {
        MergeDecision::KeepAll | MergeDecision::Skip => Ok(GroupResolution::default()),
        MergeDecision::KeepBest => Ok(collapse(group_index, group, choose_best(group), None)),
        MergeDecision::KeepOne(pos) => Ok(collapse(group_index, group, in_range(*pos)?, None)),
        MergeDecision::MergeFields { first, second, fields } => {
            let first = in_range(*first)?;
            let second = in_range(*second)?;
            if first == second {
                return Err(MergeError::DuplicateIndexPair(first + 1));
            }
            let merged = merge_fields(&group[first], &group[second], fields)?;
            let pair = [group[first].clone(), group[second].clone()];
            Ok(collapse(group_index, &pair, 0, Some(merged)))
        }
    }
}

/// Keep `members[winner]` (or `replacement`, which carries its identity)
/// and discard the rest.
fn collapse(
    group_index: usize,
    members: &[Record],
    winner: usize,
    replacement: Option<Record>,
) -> GroupResolution {
    let index = group_index.to_string();
    let sources: Vec<&str> = members
        .iter()
        .map(Record::id_str)
        .filter(|id| !id.is_empty())
        .collect();

    let mut base = replacement.unwrap_or_else(|| members[winner].clone());
    base.strip_engine_keys();
    let mut survivor = base.annotated(GROUP_INDEX_KEY, index.clone());
    if !sources.is_empty() {
        survivor = survivor.annotated(MERGED_FROM_KEY, sources.join(","));
    }

    let discarded: Vec<Record> = members
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != winner)
        .map(|(_, r)| {
            let mut loser = r.clone();
            loser.strip_engine_keys();
            loser.annotated(DISCARD_GROUP_KEY, index.clone())
        })
        .collect();

    debug!(
        group = group_index,
        kept = survivor.id_str(),
        discarded = discarded.len(),
        "near-duplicate group resolved"
    );

    GroupResolution {
        survivor: Some(survivor),
        discarded,
    }
}

/// Keep the best record of every group.
pub fn auto_resolve(groups: &[Vec<Record>]) -> MergeOutcome {
    resolve_directed(groups, |_, _| MergeDecision::KeepBest)
}

/// Resolve groups with caller-supplied decisions.
///
/// `decide` receives the 1-based group index and the group. An invalid
/// decision leaves that group untouched and the run continues.
pub fn resolve_directed<F>(groups: &[Vec<Record>], mut decide: F) -> MergeOutcome
where
    F: FnMut(usize, &[Record]) -> MergeDecision,
{
    let mut outcome = MergeOutcome::default();
    for (pos, group) in groups.iter().enumerate() {
        let group_index = pos + 1;
        let decision = decide(group_index, group);
        match resolve_group(group_index, group, &decision) {
            Ok(resolution) => outcome.absorb(group_index, resolution),
            Err(e) => {
                warn!(group = group_index, error = %e, "invalid merge decision; group skipped");
                outcome.untouched_groups.push(group_index);
            }
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// Top-level menu selection for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    KeepOne,
    KeepBest,
    KeepAll,
    Skip,
    MergeFields,
}

/// `1`-`5` (or the action word). Empty input selects keep-best.
pub fn parse_group_action(text: &str) -> Result<GroupAction, MergeError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "one" => Ok(GroupAction::KeepOne),
        "" | "2" | "best" => Ok(GroupAction::KeepBest),
        "3" | "all" => Ok(GroupAction::KeepAll),
        "4" | "skip" => Ok(GroupAction::Skip),
        "5" | "merge" => Ok(GroupAction::MergeFields),
        other => Err(MergeError::UnknownChoice(other.to_string())),
    }
}

/// 1-based entry number to a 0-based position. Empty input selects `default`.
pub fn parse_entry_index(text: &str, len: usize, default: usize) -> Result<usize, MergeError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    let n: usize = text
        .parse()
        .map_err(|_| MergeError::NotANumber(text.to_string()))?;
    if n == 0 || n > len {
        return Err(MergeError::IndexOutOfRange { index: n, len });
    }
    Ok(n - 1)
}

/// Two distinct entry numbers separated by whitespace or a comma.
pub fn parse_index_pair(text: &str, len: usize) -> Result<(usize, usize), MergeError> {
    let parts: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    let [first, second] = parts.as_slice() else {
        return Err(MergeError::NotANumber(text.trim().to_string()));
    };
    // Empty parts are filtered, so the default never applies.
    let first = parse_entry_index(first, len, 0)?;
    let second = parse_entry_index(second, len, 0)?;
    if first == second {
        return Err(MergeError::DuplicateIndexPair(first + 1));
    }
    Ok((first, second))
}

/// `a`, `b`, `s`/`skip`, or `c:VALUE`. Empty input keeps the first record's value.
pub fn parse_field_choice(text: &str) -> Result<FieldChoice, MergeError> {
    let trimmed = text.trim();
    if let Some((tag, value)) = trimmed.split_once(':') {
        if matches!(tag.trim().to_ascii_lowercase().as_str(), "c" | "custom") {
            return Ok(FieldChoice::Custom(value.to_string()));
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "a" => Ok(FieldChoice::TakeA),
        "b" => Ok(FieldChoice::TakeB),
        "s" | "skip" => Ok(FieldChoice::Skip),
        _ => Err(MergeError::UnknownChoice(trimmed.to_string())),
    }
}

pub fn parse_bool(text: &str) -> Result<bool, MergeError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        _ => Err(MergeError::InvalidBool(text.trim().to_string())),
    }
}
