//! Exact-duplicate clustering and near-duplicate grouping.
//!
//! Records are bucketed by [`GroupingKey`]. Inside a bucket the front record
//! is popped as a pivot and the remainder swept once; every record equal to
//! the pivot on the comparable fields joins its cluster. The sweep repeats
//! until the bucket is empty. Cluster representatives that still share a
//! bucket form a near-duplicate group.
//!
//! Records are addressed by input position throughout, so records that have
//! no identifier yet are still tracked exactly once.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};

use crate::config::DedupeOptions;
use crate::model::{Record, RecordKind};
use crate::normalize::{normalize_site, GroupingKey};

/// Fields that decide exact equivalence. Timestamps, provenance, tags,
/// secondary sites and the extension map are not compared.
#[derive(Debug, PartialEq)]
struct Comparable<'a> {
    kind: RecordKind,
    title: &'a str,
    username: &'a str,
    password: &'a str,
    site: String,
    notes: &'a str,
    folder: &'a str,
    favorite: bool,
    otp_uri: &'a str,
    otp_secret: &'a str,
}

impl<'a> Comparable<'a> {
    fn of(r: &'a Record) -> Self {
        Self {
            kind: r.kind,
            title: &r.title,
            username: &r.username,
            password: &r.password,
            site: normalize_site(r.primary_site.as_deref().unwrap_or("")),
            notes: &r.notes,
            folder: r.folder.as_deref().unwrap_or(""),
            favorite: r.favorite,
            otp_uri: r.otp_uri.as_deref().unwrap_or(""),
            otp_secret: r.otp_secret.as_deref().unwrap_or(""),
        }
    }
}

/// True when `a` and `b` agree on every comparable field.
pub fn is_exact_duplicate(a: &Record, b: &Record) -> bool {
    Comparable::of(a) == Comparable::of(b)
}

#[derive(Debug, Clone, Default)]
pub struct DedupeResult {
    /// Singletons plus one representative per exact cluster, in input order.
    /// Near-duplicate group members are included here until resolved.
    pub kept: Vec<Record>,
    /// Non-representative members of exact clusters, in input order.
    pub removed_exact: Vec<Record>,
    /// Clusters of size >= 2; the first record is the representative.
    pub exact_groups: Vec<Vec<Record>>,
    /// Distinct representatives sharing a grouping key, size >= 2.
    pub near_duplicate_groups: Vec<Vec<Record>>,
}

impl DedupeResult {
    pub fn input_count(&self) -> usize {
        self.kept.len() + self.removed_exact.len()
    }
}

/// Partition `records` into kept / auto-removed / near-duplicate groups.
pub fn dedupe_records(records: &[Record], options: &DedupeOptions) -> DedupeResult {
    // Buckets in first-seen order so output is reproducible.
    let mut bucket_of: HashMap<GroupingKey, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        let key = GroupingKey::for_record(record, options);
        let slot = *bucket_of.entry(key).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(pos);
    }

    let mut kept: Vec<usize> = Vec::new();
    let mut removed: Vec<usize> = Vec::new();
    let mut exact_groups: Vec<Vec<usize>> = Vec::new();
    let mut near_groups: Vec<Vec<usize>> = Vec::new();

    for bucket in buckets {
        if bucket.len() == 1 {
            kept.extend(bucket);
            continue;
        }

        let mut remaining: VecDeque<usize> = bucket.into();
        let mut representatives: Vec<usize> = Vec::new();

        while let Some(pivot) = remaining.pop_front() {
            let mut cluster = vec![pivot];
            remaining.retain(|&other| {
                if is_exact_duplicate(&records[pivot], &records[other]) {
                    cluster.push(other);
                    false
                } else {
                    true
                }
            });

            representatives.push(pivot);
            if cluster.len() > 1 {
                debug!(
                    representative = records[pivot].id_str(),
                    removed = cluster.len() - 1,
                    "exact duplicate cluster"
                );
                removed.extend_from_slice(&cluster[1..]);
                exact_groups.push(cluster);
            }
        }

        if representatives.len() > 1 {
            debug!(size = representatives.len(), "near-duplicate group");
            near_groups.push(representatives.clone());
        }
        kept.extend(representatives);
    }

    kept.sort_unstable();
    removed.sort_unstable();

    let pick = |positions: &[usize]| -> Vec<Record> {
        positions.iter().map(|&p| records[p].clone()).collect()
    };

    let result = DedupeResult {
        kept: pick(kept.as_slice()),
        removed_exact: pick(removed.as_slice()),
        exact_groups: exact_groups.iter().map(|g| pick(g.as_slice())).collect(),
        near_duplicate_groups: near_groups.iter().map(|g| pick(g.as_slice())).collect(),
    };

    info!(
        input = records.len(),
        kept = result.kept.len(),
        removed_exact = result.removed_exact.len(),
        exact_groups = result.exact_groups.len(),
        near_groups = result.near_duplicate_groups.len(),
        "dedupe complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{assign_ids, RecordId, EMAIL_KEY};

    fn login(site: &str, user: &str, pass: &str, notes: &str) -> Record {
        Record {
            primary_site: Some(site.into()),
            username: user.into(),
            password: pass.into(),
            notes: notes.into(),
            ..Record::new(RecordKind::Login)
        }
    }

    fn with_ids(mut records: Vec<Record>) -> Vec<Record> {
        assign_ids(&mut records);
        records
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(Record::id_str).collect()
    }

    #[test]
    fn normalized_sites_cluster_as_exact() {
        let records = with_ids(vec![
            login("https://Example.com/", "bob", "x", "a"),
            login("http://www.example.com", "bob", "x", "a"),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(ids(&result.kept), vec!["item-1"]);
        assert_eq!(ids(&result.removed_exact), vec!["item-2"]);
        assert_eq!(result.exact_groups.len(), 1);
        assert_eq!(ids(&result.exact_groups[0]), vec!["item-1", "item-2"]);
        assert!(result.near_duplicate_groups.is_empty());
    }

    #[test]
    fn differing_notes_make_near_group() {
        let records = with_ids(vec![
            login("https://Example.com/", "bob", "x", "a"),
            login("http://www.example.com", "bob", "x", "b"),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert!(result.removed_exact.is_empty());
        assert_eq!(result.near_duplicate_groups.len(), 1);
        assert_eq!(ids(&result.near_duplicate_groups[0]), vec!["item-1", "item-2"]);
        assert_eq!(result.kept.len(), 2);
    }

    #[test]
    fn metadata_differences_are_ignored() {
        let mut a = login("example.com", "bob", "x", "");
        a.created_at = Some(1);
        a.tags.insert("work".into());
        a.extra.insert("proton_vault".into(), "Personal".into());
        a.provenance.source = Some("protonpass".into());
        let mut b = login("example.com", "bob", "x", "");
        b.updated_at = Some(99);
        b.secondary_sites.push("m.example.com".into());
        assert!(is_exact_duplicate(&a, &b));

        b.favorite = true;
        assert!(!is_exact_duplicate(&a, &b));
    }

    #[test]
    fn missing_option_equals_empty() {
        let a = login("example.com", "bob", "x", "");
        let mut b = a.clone();
        b.folder = Some(String::new());
        assert!(is_exact_duplicate(&a, &b));
    }

    #[test]
    fn different_logins_never_group() {
        let records = with_ids(vec![
            login("example.com", "bob", "x", ""),
            login("example.com", "alice", "x", ""),
            login("other.com", "bob", "x", ""),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(result.kept.len(), 3);
        assert!(result.exact_groups.is_empty());
        assert!(result.near_duplicate_groups.is_empty());
    }

    #[test]
    fn username_case_buckets_together_but_is_not_exact() {
        let records = with_ids(vec![
            login("example.com", "Bob", "x", ""),
            login("example.com", "bob", "x", ""),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(result.near_duplicate_groups.len(), 1);
    }

    #[test]
    fn email_fallback_is_configurable() {
        let mut a = login("example.com", "", "x", "");
        a.extra.insert(EMAIL_KEY.into(), "bob@example.com".into());
        let b = login("example.com", "bob@example.com", "x", "");
        let records = with_ids(vec![a, b]);

        let loose = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(loose.near_duplicate_groups.len(), 1);

        let strict = dedupe_records(
            &records,
            &DedupeOptions {
                treat_email_as_username: false,
            },
        );
        assert!(strict.near_duplicate_groups.is_empty());
    }

    #[test]
    fn mixed_bucket_yields_clusters_and_group() {
        // 1 == 3, 2 == 4, 5 alone: two clusters, one near group of three reps
        let records = with_ids(vec![
            login("example.com", "bob", "x", "a"),
            login("example.com", "bob", "y", "a"),
            login("example.com", "bob", "x", "a"),
            login("example.com", "bob", "y", "a"),
            login("example.com", "bob", "z", "a"),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(ids(&result.kept), vec!["item-1", "item-2", "item-5"]);
        assert_eq!(ids(&result.removed_exact), vec!["item-3", "item-4"]);
        assert_eq!(ids(&result.exact_groups[0]), vec!["item-1", "item-3"]);
        assert_eq!(ids(&result.exact_groups[1]), vec!["item-2", "item-4"]);
        assert_eq!(ids(&result.near_duplicate_groups[0]), vec!["item-1", "item-2", "item-5"]);
    }

    #[test]
    fn records_without_ids_are_tracked_by_position() {
        let records = vec![
            login("example.com", "bob", "x", ""),
            login("example.com", "bob", "x", ""),
            login("example.com", "bob", "x", ""),
        ];
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.removed_exact.len(), 2);
        assert_eq!(result.input_count(), 3);
        assert!(result.kept[0].id.is_none());
    }

    #[test]
    fn kept_preserves_input_order_across_buckets() {
        let records = with_ids(vec![
            login("a.com", "u", "1", ""),
            login("b.com", "u", "1", ""),
            login("a.com", "u", "2", ""),
            login("c.com", "u", "1", ""),
        ]);
        let result = dedupe_records(&records, &DedupeOptions::default());
        assert_eq!(
            result.kept.iter().map(|r| r.id.clone().unwrap()).collect::<Vec<_>>(),
            vec![
                RecordId::new("item-1"),
                RecordId::new("item-2"),
                RecordId::new("item-3"),
                RecordId::new("item-4"),
            ]
        );
    }
}
