pub mod ast;
pub mod builder;

use crate::errors::RejectReason;
use serde::{Deserialize, Serialize};

pub use ast::{
    AssignOp, BinaryOp, Expr, ForEachLoop, LambdaBody, Literal, Stmt, TypeRef, UnaryOp,
};
pub use builder::LoopBuilder;

/// Outcome of the safety analysis for one candidate loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Safety verdict plus the informational flags downstream passes consume.
///
/// `is_reducer` marks a trailing accumulation statement; `is_concurrent`
/// marks iteration over a concurrency-aware container type. Neither flag
/// blocks conversion; weakly-consistent iteration makes simple consumption
/// safe under concurrent external mutation, so `is_concurrent` is advisory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub verdict: Verdict,
    pub is_reducer: bool,
    pub is_concurrent: bool,
}

impl SafetyReport {
    pub fn reject(reason: RejectReason) -> Self {
        SafetyReport {
            verdict: Verdict::Reject(reason),
            is_reducer: false,
            is_concurrent: false,
        }
    }
}

/// Result of a conversion attempt.
///
/// Conversion is all-or-nothing: either a complete replacement statement is
/// produced, or the loop is left untouched. `NoChange` carries the rejection
/// reason when the safety analysis declined the loop; it is `None` when an
/// internal build inconsistency forced degradation (logged separately).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Replaced(Stmt),
    NoChange(Option<RejectReason>),
}

impl Outcome {
    pub fn replacement(&self) -> Option<&Stmt> {
        match self {
            Outcome::Replaced(stmt) => Some(stmt),
            Outcome::NoChange(_) => None,
        }
    }
}

/// Structured per-loop record for diagnostics output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopDiagnostic {
    pub converted: bool,
    pub reason_code: Option<String>,
    pub is_reducer: bool,
    pub is_concurrent: bool,
}

impl LoopDiagnostic {
    pub fn from_parts(report: &SafetyReport, outcome: &Outcome) -> Self {
        let reason_code = match (&report.verdict, outcome) {
            (Verdict::Reject(r), _) => Some(r.code().to_string()),
            (_, Outcome::NoChange(Some(r))) => Some(r.code().to_string()),
            _ => None,
        };
        LoopDiagnostic {
            converted: matches!(outcome, Outcome::Replaced(_)),
            reason_code,
            is_reducer: report.is_reducer,
            is_concurrent: report.is_concurrent,
        }
    }
}
