//! Property-based tests for batch chunking and snapshot diffing.

use proptest::prelude::*;
use std::collections::BTreeMap;

use iotapi_sdk::monitor::{diff_snapshots, StatusSnapshot};
use iotapi_sdk::{chunk_device_names, DeviceStatus, StatusSummary, MAX_BATCH_DEVICES};

// =============================================================================
// Generators
// =============================================================================

fn arb_device_names(max_count: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z0-9-]{1,12}", 0..=max_count)
}

fn arb_status() -> impl Strategy<Value = DeviceStatus> {
    prop_oneof![
        Just(DeviceStatus::Online),
        Just(DeviceStatus::Offline),
        Just(DeviceStatus::Unactive),
        Just(DeviceStatus::Unknown),
        "[A-Z]{3,10}".prop_map(|raw| DeviceStatus::from(raw.as_str())),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    proptest::collection::btree_map("[A-F]", arb_status(), 0..6)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Chunking yields ceil(N/100) chunks of at most 100 names each, and
    /// concatenating them restores the input.
    #[test]
    fn prop_chunking_preserves_order_and_bounds(names in arb_device_names(450)) {
        let chunks: Vec<&[String]> = chunk_device_names(&names).collect();

        prop_assert_eq!(chunks.len(), names.len().div_ceil(MAX_BATCH_DEVICES));
        prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= MAX_BATCH_DEVICES));

        let rejoined: Vec<String> = chunks.concat();
        prop_assert_eq!(rejoined, names);
    }

    /// Every reported change refers to a device seen in both snapshots with
    /// differing statuses, and every such device is reported.
    #[test]
    fn prop_diff_reports_exactly_changed_devices(
        previous in arb_snapshot(),
        current in arb_snapshot(),
    ) {
        let changes = diff_snapshots(&previous, &current);
        let reported: BTreeMap<String, (DeviceStatus, DeviceStatus)> = changes
            .into_iter()
            .map(|c| (c.device, (c.old, c.new)))
            .collect();

        let expected: BTreeMap<String, (DeviceStatus, DeviceStatus)> = current
            .iter()
            .filter_map(|(name, new)| {
                previous
                    .get(name)
                    .filter(|old| *old != new)
                    .map(|old| (name.clone(), (old.clone(), new.clone())))
            })
            .collect();

        prop_assert_eq!(reported, expected);
    }

    /// Bucket counts never exceed the total.
    #[test]
    fn prop_summary_buckets_bounded(statuses in proptest::collection::vec(arb_status(), 0..200)) {
        let summary = StatusSummary::from_statuses(statuses.iter().cloned());
        prop_assert_eq!(summary.total, statuses.len());
        prop_assert!(summary.online + summary.offline + summary.unactive <= summary.total);
    }
}
