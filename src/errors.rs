//! Rejection reasons and internal build errors.
//!
//! The engine/host boundary is a plain accept-or-reject contract: a loop the
//! engine declines is reported through [`RejectReason`], which is data, not an
//! error; hosts surface it (or not) as a diagnostic. Only an internal
//! invariant violation while assembling a pipeline is an actual error type
//! ([`BuildError`]); it is logged and degrades to "no change produced", never
//! to incorrect output.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a candidate loop was declined.
///
/// The first three are structural rejections (unsupported loop shape); the
/// last is the modification hazard. Codes are stable for programmatic
/// handling:
///
/// - S001–S009: structural rejections
/// - M001–M009: modification hazards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The body leaves the loop through `break` or an unsanctioned `return`.
    EarlyExit,
    /// The body contains a nested iteration construct.
    NestedIteration,
    /// The iterated source's type is unknown or not an iterable container.
    IncompatibleSource,
    /// The body structurally modifies the collection being iterated.
    CollectionMutation,
}

impl RejectReason {
    pub const fn code(self) -> &'static str {
        match self {
            RejectReason::EarlyExit => "S001",
            RejectReason::NestedIteration => "S002",
            RejectReason::IncompatibleSource => "S003",
            RejectReason::CollectionMutation => "M001",
        }
    }

    /// Whether this reason is a structural rejection as opposed to a
    /// modification hazard.
    pub const fn is_structural(self) -> bool {
        !matches!(self, RejectReason::CollectionMutation)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::EarlyExit => "body exits the loop early",
            RejectReason::NestedIteration => "body contains a nested loop",
            RejectReason::IncompatibleSource => "iterated source is not a supported collection",
            RejectReason::CollectionMutation => "body modifies the iterated collection",
        };
        write!(f, "{}: {}", self.code(), msg)
    }
}

/// Internal inconsistency while assembling a pipeline.
///
/// These indicate an engine defect, not a property of the input; callers see
/// them only as "no replacement produced". They are logged at `warn` level at
/// the point of degradation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A stage references a binding retired by an earlier transform stage.
    #[error("stage references stale binding `{binding}`")]
    StaleBinding { binding: String },

    /// More than one terminal operation survived classification.
    #[error("operation sequence contains multiple terminal operations")]
    MultipleTerminals,

    /// A terminal operation is not the final element of the sequence.
    #[error("terminal operation is not last in the sequence")]
    MisplacedTerminal,

    /// A reduce terminal reached the builder without an accumulator binding.
    #[error("reduce operation has no accumulator binding")]
    MissingAccumulator,

    /// The classified sequence does not end in a terminal operation.
    #[error("operation sequence has no terminal operation")]
    MissingTerminal,

    /// The classified sequence is empty; nothing to build.
    #[error("operation sequence is empty")]
    EmptySequence,
}
