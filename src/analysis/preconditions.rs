//! Safety analysis for one candidate loop.
//!
//! Pure analysis, no side effects: walks the body once and produces the
//! [`SafetyReport`] downstream passes are gated on. Rejections carry a
//! structured reason; nothing here is an error. Conditional `continue` is
//! accepted (it becomes a negated filter later), and iteration over a
//! concurrency-aware container is accepted too (its weakly-consistent
//! iterators keep simple consumption safe), but both facts are reported as
//! informational flags.

use crate::analysis::{concurrency, modification};
use crate::core::ast::{Expr, ForEachLoop, Literal, Stmt};
use crate::core::{SafetyReport, Verdict};
use crate::errors::RejectReason;
use crate::pipeline::reduce;
use crate::resolve::TypeResolver;

/// Runs every precondition against the loop and collects the verdict plus
/// the informational flags.
pub fn check(lp: &ForEachLoop, resolver: &dyn TypeResolver) -> SafetyReport {
    if let Some(reason) = scan_structure(&lp.body, lp.boolean_search, false) {
        log::debug!("rejecting loop over `{:?}`: {reason}", lp.source);
        return SafetyReport::reject(reason);
    }

    if let Some(target) = iterated_target(&lp.source) {
        if lp
            .body
            .iter()
            .any(|s| modification::stmt_modifies(s, &target))
        {
            log::debug!("rejecting loop over `{target}`: iterated collection is modified");
            return SafetyReport::reject(RejectReason::CollectionMutation);
        }
    }

    let source_type = iterated_target(&lp.source).and_then(|name| resolver.declared_type(&name));
    let Some(source_type) = source_type else {
        return SafetyReport::reject(RejectReason::IncompatibleSource);
    };
    if !resolver.is_iterable(&source_type) {
        return SafetyReport::reject(RejectReason::IncompatibleSource);
    }

    SafetyReport {
        verdict: Verdict::Accept,
        is_reducer: trailing_reduce(&lp.body, resolver),
        is_concurrent: concurrency::is_concurrent_type(&source_type),
    }
}

/// Finds an unconditional early exit or a nested iteration construct.
///
/// `guarded` is true inside a conditional branch; only there can a
/// boolean-literal return be sanctioned, and only when the loop is a known
/// boolean search.
fn scan_structure(stmts: &[Stmt], boolean_search: bool, guarded: bool) -> Option<RejectReason> {
    for stmt in stmts {
        match stmt {
            Stmt::Break => return Some(RejectReason::EarlyExit),
            Stmt::Return(value) => {
                let sanctioned = boolean_search
                    && guarded
                    && matches!(value, Some(Expr::Lit(Literal::Bool(_))));
                if !sanctioned {
                    return Some(RejectReason::EarlyExit);
                }
            }
            Stmt::ForEach(_) | Stmt::While { .. } => {
                return Some(RejectReason::NestedIteration);
            }
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                if let Some(reason) = scan_structure(then_body, boolean_search, true) {
                    return Some(reason);
                }
                if let Some(else_body) = else_body {
                    if let Some(reason) = scan_structure(else_body, boolean_search, true) {
                        return Some(reason);
                    }
                }
            }
            Stmt::Continue | Stmt::Expr(_) | Stmt::Local { .. } => {}
        }
    }
    None
}

/// The binding name the loop iterates, when the source expression is one the
/// modification detector can track: a direct name, a member of the enclosing
/// instance, or an accessor-convention call.
fn iterated_target(source: &Expr) -> Option<String> {
    match source {
        Expr::Name(name) => Some(name.clone()),
        Expr::Field { receiver, name } if matches!(**receiver, Expr::This) => Some(name.clone()),
        Expr::Call {
            receiver,
            method,
            args,
        } if args.is_empty() => {
            let unqualified = match receiver {
                None => true,
                Some(r) => matches!(**r, Expr::This),
            };
            if !unqualified {
                return None;
            }
            ["get", "fetch", "retrieve", "obtain"]
                .iter()
                .find_map(|prefix| method.strip_prefix(prefix))
                .filter(|suffix| !suffix.is_empty())
                .map(decapitalize)
        }
        _ => None,
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether the body's trailing statement, possibly inside a trailing
/// conditional, is an accumulation update.
fn trailing_reduce(body: &[Stmt], resolver: &dyn TypeResolver) -> bool {
    match body.last() {
        Some(Stmt::If {
            then_body,
            else_body: None,
            ..
        }) => trailing_reduce(then_body, resolver),
        Some(stmt) => reduce::detect(stmt, resolver).is_some(),
        None => false,
    }
}
