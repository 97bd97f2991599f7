//! Concurrent collection type classification.
//!
//! A fixed, closed set of concurrency-aware container types. Iterating one of
//! these is never a reason to block conversion (their iterators are weakly
//! consistent, so simple consumption stays safe under concurrent external
//! mutation), but the flag is reported so hosts can annotate the conversion.

use crate::core::ast::TypeRef;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Concurrency-aware container types: copy-on-write lists and sets, lock-free
/// maps and skip structures, and the blocking queue/deque flavors.
static CONCURRENT_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "CopyOnWriteArrayList",
        "CopyOnWriteArraySet",
        "ConcurrentHashMap",
        "ConcurrentSkipListMap",
        "ConcurrentSkipListSet",
        "ConcurrentLinkedQueue",
        "ConcurrentLinkedDeque",
        "LinkedBlockingQueue",
        "LinkedBlockingDeque",
        "ArrayBlockingQueue",
        "PriorityBlockingQueue",
        "LinkedTransferQueue",
    ]
    .into_iter()
    .collect()
});

/// Whether the resolved type is one of the known concurrency-aware
/// containers. Matching is on the erased/raw name, so generic instantiation
/// and package qualification never defeat it.
pub fn is_concurrent_type(ty: &TypeRef) -> bool {
    is_concurrent_type_name(ty.raw_name())
}

/// Name-based variant for hosts that only have a (possibly qualified) type
/// name in hand.
pub fn is_concurrent_type_name(name: &str) -> bool {
    let simple = name.rsplit('.').next().unwrap_or(name);
    CONCURRENT_TYPES.contains(simple)
}
