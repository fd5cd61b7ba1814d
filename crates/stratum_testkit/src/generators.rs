//! Property-based test generators using proptest.
//!
//! Names produced here are always accepted by the data managers; use them
//! to drive valid traffic and assert on state, not on validation.

use proptest::prelude::*;
use stratum_core::SegmentMetadata;

/// Strategy for generating valid resource names.
pub fn resource_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid segment names.
pub fn segment_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,23}").expect("Invalid regex")
}

/// Strategy for generating metadata of a segment of `resource`.
pub fn segment_metadata_strategy(resource: String) -> impl Strategy<Value = SegmentMetadata> {
    (
        segment_name_strategy(),
        0u64..1_000_000,
        prop::option::of("[0-9]{1,10}"),
    )
        .prop_map(move |(name, total_docs, crc)| {
            let mut metadata = SegmentMetadata::new(name, resource.as_str()).with_total_docs(total_docs);
            metadata.crc = crc;
            metadata
        })
}

/// Strategy for a sequence of adds over a few resources and segment names.
///
/// Names are drawn from small pools so sequences contain both first adds
/// and replacements.
pub fn add_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<SegmentMetadata>> {
    prop::collection::vec(
        (0usize..3, 0usize..5, any::<u64>()),
        1..max_len.max(2),
    )
    .prop_map(|adds| {
        adds.into_iter()
            .map(|(resource, segment, docs)| {
                SegmentMetadata::new(format!("seg_{segment}"), format!("table_{resource}"))
                    .with_total_docs(docs)
            })
            .collect()
    })
}
