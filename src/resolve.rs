//! Collaborator seams: binding resolution and fresh-name generation.
//!
//! The engine consumes two services from its host: type-resolution queries
//! for named bindings, and a uniqueness-checked source of fresh names for
//! synthesized lambda parameters. Both are traits so IDE-grade hosts can
//! plug their own binding machinery in; the in-memory defaults here are what
//! the tests and simple hosts use.

use crate::analysis::concurrency;
use crate::core::ast::TypeRef;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Iterable container types the default resolver accepts as loop sources.
static ITERABLE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Collection",
        "Iterable",
        "List",
        "ArrayList",
        "LinkedList",
        "Vector",
        "Set",
        "HashSet",
        "LinkedHashSet",
        "TreeSet",
        "SortedSet",
        "NavigableSet",
        "Queue",
        "Deque",
        "ArrayDeque",
        "PriorityQueue",
    ]
    .into_iter()
    .collect()
});

/// Type-resolution queries the engine issues against the enclosing scope.
pub trait TypeResolver {
    /// Declared type of a named binding, if the host can resolve it.
    fn declared_type(&self, binding: &str) -> Option<TypeRef>;

    /// Whether the given type supports bounded element iteration. The
    /// default accepts the standard container interfaces and every
    /// concurrency-aware container the classifier knows.
    fn is_iterable(&self, ty: &TypeRef) -> bool {
        ITERABLE_TYPES.contains(ty.raw_name()) || concurrency::is_concurrent_type(ty)
    }
}

/// Map-backed resolver: the host registers each binding's declared type.
#[derive(Clone, Debug, Default)]
pub struct ScopeTypes {
    types: HashMap<String, TypeRef>,
}

impl ScopeTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, binding: impl Into<String>, ty: TypeRef) -> Self {
        self.types.insert(binding.into(), ty);
        self
    }

    pub fn insert(&mut self, binding: impl Into<String>, ty: TypeRef) {
        self.types.insert(binding.into(), ty);
    }
}

impl TypeResolver for ScopeTypes {
    fn declared_type(&self, binding: &str) -> Option<TypeRef> {
        self.types.get(binding).cloned()
    }
}

/// Uniqueness-checked source of fresh names for synthesized parameters.
pub trait FreshNameSource {
    /// Returns `hint` if unused, otherwise a numbered variant of it. The
    /// returned name is recorded as taken.
    fn fresh(&mut self, hint: &str) -> String;
}

/// Default fresh-name source seeded with the names already in scope.
#[derive(Clone, Debug, Default)]
pub struct SerialNames {
    taken: HashSet<String>,
}

impl SerialNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserving(names: impl IntoIterator<Item = String>) -> Self {
        SerialNames {
            taken: names.into_iter().collect(),
        }
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }
}

impl FreshNameSource for SerialNames {
    fn fresh(&mut self, hint: &str) -> String {
        if self.taken.insert(hint.to_string()) {
            return hint.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{hint}{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
