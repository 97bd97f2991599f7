//! Per-loop conversion entry points.
//!
//! One candidate loop in, one verdict or replacement statement out. The
//! engine holds no cross-invocation state: every call is a fresh analysis
//! over the caller's immutable tree, so separate worker threads may convert
//! distinct trees concurrently. Conversion is strictly all-or-nothing: on
//! any rejection or internal inconsistency the original loop stands.

use crate::analysis;
use crate::core::ast::ForEachLoop;
use crate::core::{LoopDiagnostic, Outcome, SafetyReport, Verdict};
use crate::pipeline::{wrapper, BodyParser, PipelineBuilder};
use crate::resolve::{SerialNames, TypeResolver};

/// The loop-to-pipeline conversion engine, bound to the host's
/// binding-resolution service.
pub struct Converter<'a> {
    resolver: &'a dyn TypeResolver,
}

impl<'a> Converter<'a> {
    pub fn new(resolver: &'a dyn TypeResolver) -> Self {
        Converter { resolver }
    }

    /// The "is this applicable here" probe: runs only the safety analysis.
    pub fn check(&self, lp: &ForEachLoop) -> SafetyReport {
        analysis::check(lp, self.resolver)
    }

    /// Attempts the full conversion. Returns the replacement statement, or
    /// no-change with the rejection reason when the safety analysis declined
    /// the loop. Parse- and build-stage degradations carry no reason code.
    pub fn convert(&self, lp: &ForEachLoop) -> Outcome {
        let report = self.check(lp);
        self.convert_checked(lp, &report)
    }

    /// Conversion plus the structured diagnostic record for the host.
    pub fn convert_with_diagnostic(&self, lp: &ForEachLoop) -> (Outcome, LoopDiagnostic) {
        let report = self.check(lp);
        let outcome = self.convert_checked(lp, &report);
        let diagnostic = LoopDiagnostic::from_parts(&report, &outcome);
        (outcome, diagnostic)
    }

    fn convert_checked(&self, lp: &ForEachLoop, report: &SafetyReport) -> Outcome {
        if let Verdict::Reject(reason) = &report.verdict {
            return Outcome::NoChange(Some(*reason));
        }

        let parser = BodyParser::new(self.resolver, lp.boolean_search);
        let Some(ops) = parser.parse(lp) else {
            log::debug!("loop body has no faithful pipeline rendering; leaving it unchanged");
            return Outcome::NoChange(None);
        };

        let mut names = reserved_names(lp);
        match PipelineBuilder::build(lp, &ops, &mut names) {
            Ok(pipeline) => Outcome::Replaced(wrapper::wrap(pipeline)),
            Err(err) => {
                log::warn!("pipeline build inconsistency, no edit produced: {err}");
                Outcome::NoChange(None)
            }
        }
    }
}

/// Seeds the fresh-name source with every name visible in the loop, so
/// synthesized parameters cannot collide with user bindings.
fn reserved_names(lp: &ForEachLoop) -> SerialNames {
    let mut names = SerialNames::new();
    names.reserve(lp.binding.clone());
    for stmt in &lp.body {
        stmt.walk_exprs(&mut |e| {
            if let crate::core::ast::Expr::Name(n) = e {
                names.reserve(n.clone());
            }
        });
        stmt.walk(&mut |s| {
            if let crate::core::ast::Stmt::Local { name, .. } = s {
                names.reserve(name.clone());
            }
        });
    }
    names
}
