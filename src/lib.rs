// Export modules for library usage
pub mod analysis;
pub mod core;
pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod resolve;

// Re-export commonly used types
pub use crate::core::{
    Expr, ForEachLoop, LambdaBody, Literal, LoopBuilder, LoopDiagnostic, Outcome, SafetyReport,
    Stmt, TypeRef, Verdict,
};

pub use crate::analysis::{
    concurrency::is_concurrent_type, modification::stmt_modifies, preconditions::check,
};

pub use crate::engine::Converter;

pub use crate::errors::{BuildError, RejectReason};

pub use crate::pipeline::{CandidateOp, Pipeline, ReducerKind, Stage, TerminalKind};

pub use crate::render::to_source;

pub use crate::resolve::{FreshNameSource, ScopeTypes, SerialNames, TypeResolver};
