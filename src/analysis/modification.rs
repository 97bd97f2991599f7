//! Detection of structural modifications to the iterated collection.
//!
//! A conversion must not be offered when the loop body mutates the very
//! collection it iterates; that is the iteration-consistency hazard. The
//! detector recognizes a fixed vocabulary of mutating method names and three
//! increasingly permissive receiver matches against the iterated target:
//!
//! 1. direct reference: `items.remove(x)`
//! 2. member access on the enclosing instance: `this.items.remove(x)`
//! 3. accessor-convention call: `getItems().remove(x)`: a zero-argument
//!    call whose name is an accessor prefix plus the target name
//!    (case-insensitive), a one-level indirection heuristic.
//!
//! Both the receiver match and the method-name match must hold: a mutating
//! call on an *unrelated* collection never blocks conversion. Arbitrary
//! receiver expressions (indexing, multi-level accessor chains) and indirect
//! mutation through opaque helpers are out of reach and accepted as residual
//! risk; the resulting runtime fault surfaces independently of this cleanup.

use crate::core::ast::{Expr, Stmt};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Method names that structurally modify a collection or map.
static MUTATING_METHODS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // collection / list
        "add",
        "remove",
        "clear",
        "set",
        "addAll",
        "removeAll",
        "retainAll",
        "removeIf",
        "replaceAll",
        "sort",
        // map
        "put",
        "putAll",
        "putIfAbsent",
        "compute",
        "computeIfAbsent",
        "computeIfPresent",
        "merge",
        "replace",
    ]
    .into_iter()
    .collect()
});

/// Accessor-name prefixes for the one-level indirection heuristic.
const ACCESSOR_PREFIXES: [&str; 4] = ["get", "fetch", "retrieve", "obtain"];

/// Whether any call in `stmt` structurally modifies the collection named
/// `target`.
pub fn stmt_modifies(stmt: &Stmt, target: &str) -> bool {
    let mut found = false;
    stmt.walk_exprs(&mut |e| {
        if !found && expr_is_modification(e, target) {
            found = true;
        }
    });
    found
}

/// Whether `expr` is itself a mutating call against `target`.
pub fn expr_is_modification(expr: &Expr, target: &str) -> bool {
    let Expr::Call {
        receiver: Some(receiver),
        method,
        ..
    } = expr
    else {
        return false;
    };
    if !MUTATING_METHODS.contains(method.as_str()) {
        return false;
    }
    receiver_names_target(receiver.as_ref(), target)
}

fn receiver_names_target(receiver: &Expr, target: &str) -> bool {
    match receiver {
        // items.remove(x)
        Expr::Name(name) => name == target,
        // this.items.remove(x)
        Expr::Field {
            receiver: inner,
            name,
        } => matches!(**inner, Expr::This) && name == target,
        // getItems().remove(x), this.fetchItems().clear()
        Expr::Call {
            receiver: inner,
            method,
            args,
        } => {
            let unqualified = match inner {
                None => true,
                Some(r) => matches!(**r, Expr::This),
            };
            unqualified && args.is_empty() && accessor_matches(method, target)
        }
        _ => false,
    }
}

/// `getItems` names `items`; `fetchMap` names `map`. Case-insensitive on the
/// suffix so `getdata` still names `data`.
fn accessor_matches(method: &str, target: &str) -> bool {
    ACCESSOR_PREFIXES.iter().any(|prefix| {
        method
            .strip_prefix(prefix)
            .is_some_and(|suffix| !suffix.is_empty() && suffix.eq_ignore_ascii_case(target))
    })
}
