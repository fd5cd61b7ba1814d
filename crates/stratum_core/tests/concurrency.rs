//! Concurrency and property tests for segment adds through the node.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Barrier};
use std::thread;
use stratum_core::{InstanceDataManager, InstanceDataManagerConfig, SegmentMetadata};

fn started_node() -> Arc<InstanceDataManager> {
    let manager = InstanceDataManager::default();
    manager.init(InstanceDataManagerConfig::new()).unwrap();
    manager.start().unwrap();
    Arc::new(manager)
}

#[test]
fn fresh_node_scenario() {
    let manager = InstanceDataManager::default();
    manager.init(InstanceDataManagerConfig::new()).unwrap();

    manager
        .add_segment(SegmentMetadata::new("seg1", "table2").with_crc("111"))
        .unwrap();
    let resource = manager.get_resource_data_manager("table2").unwrap();
    assert_eq!(resource.segment_count(), 1);

    manager
        .add_segment(SegmentMetadata::new("seg1", "table2").with_crc("222"))
        .unwrap();

    assert_eq!(manager.resource_names(), vec!["table2"]);
    let segments = resource.get_all_segments();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].name(), "seg1");
    assert_eq!(segments[0].metadata().crc.as_deref(), Some("222"));
}

#[test]
fn concurrent_first_adds_to_one_resource() {
    let manager = started_node();
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager
                    .add_segment(SegmentMetadata::new(format!("seg{i}"), "shared"))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("adder panicked");
    }

    assert_eq!(manager.resource_names(), vec!["shared"]);
    let resource = manager.get_resource_data_manager("shared").unwrap();
    assert_eq!(resource.segment_count(), 16);
    assert_eq!(resource.stats().starts, 1);
}

#[test]
fn readers_see_consistent_snapshots() {
    let manager = started_node();
    manager.add_segment(SegmentMetadata::new("s0", "t")).unwrap();
    let resource = manager.get_resource_data_manager("t").unwrap();

    let writer = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            for i in 1..500 {
                manager
                    .add_segment(SegmentMetadata::new(format!("s{i}"), "t"))
                    .unwrap();
            }
        })
    };

    let reader = thread::spawn(move || {
        let mut last = 0;
        for _ in 0..500 {
            let snapshot = resource.get_all_segments();
            let names: BTreeSet<_> = snapshot.iter().map(|s| s.name().to_string()).collect();
            assert_eq!(names.len(), snapshot.len());
            assert!(snapshot.len() >= last);
            last = snapshot.len();
        }
    });

    writer.join().expect("writer panicked");
    reader.join().expect("reader panicked");
    assert_eq!(manager.server_info().segment_count(), 500);
}

#[test]
fn shutdown_races_with_adds() {
    let manager = started_node();
    for r in 0..4 {
        manager
            .add_segment(SegmentMetadata::new("seed", format!("t{r}")))
            .unwrap();
    }

    let adders: Vec<_> = (0..4)
        .map(|r| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..200 {
                    // Adds after shutdown must fail with an illegal state.
                    if let Err(e) =
                        manager.add_segment(SegmentMetadata::new(format!("s{i}"), format!("t{r}")))
                    {
                        assert!(e.is_illegal_state(), "{e}");
                    }
                }
            })
        })
        .collect();

    assert!(manager.shut_down());
    for handle in adders {
        handle.join().expect("adder panicked");
    }

    assert!(!manager.is_started());
    for resource in manager.get_resource_data_managers() {
        assert_eq!(resource.segment_count(), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn distinct_resources_register_once(resources in prop::collection::btree_set("[a-z]{1,8}", 1..12)) {
        let manager = started_node();
        let resources: Vec<String> = resources.into_iter().collect();

        let handles: Vec<_> = resources
            .iter()
            .cloned()
            .flat_map(|r| {
                (0..3).map(move |i| (r.clone(), i))
            })
            .map(|(resource, i)| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.add_segment(SegmentMetadata::new(format!("seg{i}"), resource)))
            })
            .collect();

        for handle in handles {
            prop_assert!(handle.join().expect("adder panicked").is_ok());
        }

        prop_assert_eq!(manager.resource_names(), resources);
        for resource in manager.get_resource_data_managers() {
            prop_assert_eq!(resource.segment_count(), 3);
            prop_assert_eq!(resource.stats().starts, 1);
        }
    }

    #[test]
    fn last_writer_wins(adds in prop::collection::vec(("[a-c]", 0u64..1000), 1..40)) {
        let manager = InstanceDataManager::default();
        manager.init(InstanceDataManagerConfig::new()).unwrap();

        let mut expected = BTreeMap::new();
        for (segment, docs) in &adds {
            manager
                .add_segment(SegmentMetadata::new(segment.clone(), "t").with_total_docs(*docs))
                .unwrap();
            expected.insert(segment.clone(), *docs);
        }

        let resource = manager.get_resource_data_manager("t").unwrap();
        prop_assert_eq!(resource.segment_count(), expected.len());
        for (segment, docs) in expected {
            prop_assert_eq!(resource.get_segment(&segment).unwrap().metadata().total_docs, docs);
        }
        prop_assert_eq!(resource.stats().segments_added, adds.len() as u64);
    }
}
