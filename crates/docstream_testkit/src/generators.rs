//! Property-based test generators using proptest.

use crate::fixtures::Person;
use docstream_store::SessionSupport;
use proptest::prelude::*;

/// Strategy for batch sizes worth testing, biased toward small values.
pub fn batch_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        3 => 1usize..=8,
        1 => 9usize..=200,
    ]
}

/// Strategy for result set sizes, including empty.
pub fn record_count_strategy() -> impl Strategy<Value = u64> {
    0u64..=300
}

/// Strategy for collection names in snake case.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,23}").expect("Invalid regex")
}

/// Strategy for arbitrary sample persons.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        any::<u64>(),
        "[a-z]{1,12}",
        prop_oneof![Just("active"), Just("retired")],
    )
        .prop_map(|(seq, name, status)| Person {
            seq,
            name,
            status: status.to_string(),
        })
}

/// Strategy for session behaviours that still let a cursor open.
pub fn working_session_support_strategy() -> impl Strategy<Value = SessionSupport> {
    prop_oneof![
        Just(SessionSupport::Supported),
        Just(SessionSupport::Unsupported),
        Just(SessionSupport::Rejected),
    ]
}

/// Number of failing probes that a retry budget of `max_attempts` absorbs.
pub fn absorbable_failures_strategy(max_attempts: u32) -> impl Strategy<Value = u32> {
    0..max_attempts
}
