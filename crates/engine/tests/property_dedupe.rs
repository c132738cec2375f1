// Property-based tests for grouping, resolution and reconciliation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, HashMap, HashSet};

use proptest::prelude::*;
use creddedupe_engine::dedupe::{dedupe_records, is_exact_duplicate};
use creddedupe_engine::merge::{auto_resolve, choose_best};
use creddedupe_engine::normalize::GroupingKey;
use creddedupe_engine::model::{DISCARD_GROUP_KEY, GROUP_INDEX_KEY, MERGED_FROM_KEY};
use creddedupe_engine::{
    assign_ids, reconcile, run, AuditAction, DedupeOptions, Record, RecordKind, Resolution,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small alphabets so collisions (and therefore groups) are common.
fn arb_site() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("https://example.com/".to_string()),
        Just("http://www.example.com".to_string()),
        Just("EXAMPLE.com/login/".to_string()),
        Just("example.com/login".to_string()),
        Just("other.org".to_string()),
        Just("".to_string()),
    ]
}

/// Extension maps that sometimes carry stale or bogus engine annotations.
fn arb_extra() -> impl Strategy<Value = BTreeMap<String, String>> {
    let key = prop_oneof![
        Just(GROUP_INDEX_KEY),
        Just(MERGED_FROM_KEY),
        Just(DISCARD_GROUP_KEY),
        Just("custom"),
    ];
    let value = prop_oneof![
        Just("oops"),
        Just("1"),
        Just("item-1"),
        Just("item-1,item-2,item-3"),
        Just(""),
    ];
    proptest::collection::btree_map(key, value, 0..3).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    })
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        arb_site(),
        prop_oneof![Just("bob"), Just("Bob"), Just("alice"), Just("")],
        prop_oneof![Just("x"), Just("y")],
        prop_oneof![Just(""), Just("note")],
        prop::bool::ANY,
        prop::option::of(0i64..5),
        arb_extra(),
    )
        .prop_map(|(site, user, pass, notes, favorite, updated, extra)| Record {
            primary_site: Some(site),
            username: user.to_string(),
            password: pass.to_string(),
            notes: notes.to_string(),
            favorite,
            updated_at: updated,
            extra,
            ..Record::new(RecordKind::Login)
        })
}

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(arb_record(), 0..24).prop_map(|mut records| {
        assign_ids(&mut records);
        records
    })
}

fn id_list(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id_str().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn every_input_is_kept_or_removed_once(records in arb_records()) {
        let result = dedupe_records(&records, &DedupeOptions::default());

        let mut seen: HashMap<String, usize> = HashMap::new();
        for id in id_list(&result.kept).into_iter().chain(id_list(&result.removed_exact)) {
            *seen.entry(id).or_default() += 1;
        }
        prop_assert_eq!(seen.len(), records.len());
        prop_assert!(seen.values().all(|&n| n == 1));

        // near-group members are a subset of kept
        let kept: HashSet<String> = id_list(&result.kept).into_iter().collect();
        for group in &result.near_duplicate_groups {
            for id in id_list(group) {
                prop_assert!(kept.contains(&id));
            }
        }
    }

    #[test]
    fn exact_clusters_are_closed(records in arb_records()) {
        let result = dedupe_records(&records, &DedupeOptions::default());
        for group in &result.exact_groups {
            prop_assert!(group.len() >= 2);
            for member in &group[1..] {
                prop_assert!(is_exact_duplicate(&group[0], member));
            }
        }
        // No two kept records in one bucket are exact duplicates of each other.
        for (i, a) in result.kept.iter().enumerate() {
            for b in &result.kept[i + 1..] {
                prop_assert!(!is_exact_duplicate(a, b));
            }
        }
    }

    #[test]
    fn near_groups_share_one_key(records in arb_records()) {
        let options = DedupeOptions::default();
        let result = dedupe_records(&records, &options);
        for group in &result.near_duplicate_groups {
            prop_assert!(group.len() >= 2);
            let key = GroupingKey::for_record(&group[0], &options);
            for member in group {
                prop_assert_eq!(&GroupingKey::for_record(member, &options), &key);
            }
            let distinct: HashSet<String> = id_list(group).into_iter().collect();
            prop_assert_eq!(distinct.len(), group.len());
        }
    }

    #[test]
    fn best_choice_is_deterministic(records in arb_records()) {
        let result = dedupe_records(&records, &DedupeOptions::default());
        for group in &result.near_duplicate_groups {
            prop_assert_eq!(choose_best(group), choose_best(group));
        }
        prop_assert_eq!(
            auto_resolve(&result.near_duplicate_groups),
            auto_resolve(&result.near_duplicate_groups)
        );
    }

    #[test]
    fn reconciled_output_has_unique_ids(records in arb_records()) {
        let result = dedupe_records(&records, &DedupeOptions::default());
        let outcome = auto_resolve(&result.near_duplicate_groups);
        let final_records = reconcile(&result.kept, &outcome.survivors, &outcome.discarded);

        let ids = id_list(&final_records);
        let unique: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());

        // one survivor per group replaces all of its members
        let expected = result.kept.len()
            - result.near_duplicate_groups.iter().map(Vec::len).sum::<usize>()
            + result.near_duplicate_groups.len();
        prop_assert_eq!(final_records.len(), expected);
    }

    #[test]
    fn input_annotations_never_drop_ungrouped_records(records in arb_records()) {
        let out = run(records, &DedupeOptions::default(), Resolution::Auto);

        let final_ids: HashSet<String> = id_list(&out.final_records).into_iter().collect();
        let grouped: HashSet<String> = out
            .dedupe
            .near_duplicate_groups
            .iter()
            .flat_map(|g| id_list(g))
            .collect();
        for record in &out.dedupe.kept {
            if !grouped.contains(record.id_str()) {
                prop_assert!(final_ids.contains(record.id_str()));
            }
        }

        let merges = out
            .audit
            .entries()
            .iter()
            .filter(|e| e.action == AuditAction::ManualMerge)
            .count();
        prop_assert_eq!(merges, out.dedupe.near_duplicate_groups.len());
        prop_assert_eq!(out.outcome.survivors.len(), out.dedupe.near_duplicate_groups.len());
    }
}
