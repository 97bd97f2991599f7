//! Accumulation-pattern detection and reducer synthesis.
//!
//! Recognizes the update shapes that become reduce terminals and knows, per
//! kind, how to synthesize the identity element and the two-argument
//! accumulator function. Built-in named function references are preferred
//! (a width-matched `sum` reference, the textual append reference,
//! `Math::max`/`Math::min`); everything else gets an inline two-parameter
//! function literal.

use crate::core::ast::{AssignOp, BinaryOp, Expr, Literal, Stmt, TypeRef, UnaryOp};
use crate::resolve::TypeResolver;
use serde::{Deserialize, Serialize};

/// The accumulation kinds a loop statement can classify into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducerKind {
    /// `i++`, `++i`: counts elements upward.
    Increment,
    /// `i--`, `--i`, `i -= 1`: counts elements downward.
    Decrement,
    /// `sum += value` over a numeric accumulator.
    Sum,
    /// `product *= value`.
    Product,
    /// `text += value` over a textual accumulator.
    StringConcat,
    /// `m = Math.max(m, value)`.
    Max,
    /// `m = Math.min(m, value)`.
    Min,
}

impl ReducerKind {
    /// Counting kinds fold a synthesized literal 1 instead of a value taken
    /// from the update statement.
    pub fn is_counting(self) -> bool {
        matches!(self, ReducerKind::Increment | ReducerKind::Decrement)
    }

    pub fn is_min_max(self) -> bool {
        matches!(self, ReducerKind::Max | ReducerKind::Min)
    }

    /// The identity element literal for this kind, in the form matching the
    /// accumulator's declared type: floating (`0.0`), wide-integer (`0L`),
    /// narrow-integer-with-cast (`(byte) 0`), empty-textual (`""`). Min/max
    /// kinds have none; their identity is always the accumulator reference.
    pub fn identity_element(self, acc_type: Option<&TypeRef>) -> Option<Expr> {
        match self {
            ReducerKind::Increment | ReducerKind::Decrement | ReducerKind::Sum => {
                Some(typed_literal(acc_type, 0))
            }
            ReducerKind::Product => Some(typed_literal(acc_type, 1)),
            ReducerKind::StringConcat => Some(Expr::Lit(Literal::Str(String::new()))),
            ReducerKind::Max | ReducerKind::Min => None,
        }
    }

    /// The two-argument accumulator function for the reduce call.
    pub fn accumulator_fn(self, acc_type: Option<&TypeRef>) -> Expr {
        match self {
            ReducerKind::Increment | ReducerKind::Sum => sum_reference(acc_type),
            ReducerKind::Decrement => binary_fold(BinaryOp::Sub),
            ReducerKind::Product => binary_fold(BinaryOp::Mul),
            ReducerKind::StringConcat => Expr::method_ref("String", "concat"),
            ReducerKind::Max => Expr::method_ref("Math", "max"),
            ReducerKind::Min => Expr::method_ref("Math", "min"),
        }
    }
}

/// A detected accumulation update: the kind, the accumulator binding, its
/// declared type when resolvable, and the per-element value expression for
/// non-counting kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducePattern {
    pub kind: ReducerKind,
    pub accumulator: String,
    pub acc_type: Option<TypeRef>,
    pub value: Option<Expr>,
}

/// Classifies a statement as an accumulation update, or `None`.
pub fn detect(stmt: &Stmt, resolver: &dyn TypeResolver) -> Option<ReducePattern> {
    let Stmt::Expr(expr) = stmt else {
        return None;
    };
    match expr {
        Expr::Unary { op, operand } if op.is_step() => {
            let Expr::Name(name) = operand.as_ref() else {
                return None;
            };
            let acc_type = resolver.declared_type(name);
            // an unresolvable binding is presumed int; a resolvable
            // non-numeric one is not a counting accumulator
            if acc_type.as_ref().is_some_and(|t| !t.is_numeric()) {
                return None;
            }
            let kind = match op {
                UnaryOp::PreIncrement | UnaryOp::PostIncrement => ReducerKind::Increment,
                UnaryOp::PreDecrement | UnaryOp::PostDecrement => ReducerKind::Decrement,
                _ => unreachable!(),
            };
            Some(ReducePattern {
                kind,
                accumulator: name.clone(),
                acc_type,
                value: None,
            })
        }
        Expr::Assign { op, target, value } => {
            let Expr::Name(name) = target.as_ref() else {
                return None;
            };
            let acc_type = resolver.declared_type(name);
            match op {
                AssignOp::AddAssign => {
                    let kind = if acc_type.as_ref().is_some_and(TypeRef::is_textual) {
                        ReducerKind::StringConcat
                    } else {
                        ReducerKind::Sum
                    };
                    Some(ReducePattern {
                        kind,
                        accumulator: name.clone(),
                        acc_type,
                        value: Some(value.as_ref().clone()),
                    })
                }
                AssignOp::SubAssign => {
                    // only the step form `i -= 1` counts; general subtraction
                    // has no reduce analog here
                    if matches!(value.as_ref(), Expr::Lit(Literal::Int(1))) {
                        Some(ReducePattern {
                            kind: ReducerKind::Decrement,
                            accumulator: name.clone(),
                            acc_type,
                            value: None,
                        })
                    } else {
                        None
                    }
                }
                AssignOp::MulAssign => Some(ReducePattern {
                    kind: ReducerKind::Product,
                    accumulator: name.clone(),
                    acc_type,
                    value: Some(value.as_ref().clone()),
                }),
                AssignOp::Set => detect_min_max(name, value, acc_type),
            }
        }
        _ => None,
    }
}

/// `m = Math.max(m, value)` and the `min` twin, either argument order.
fn detect_min_max(name: &str, value: &Expr, acc_type: Option<TypeRef>) -> Option<ReducePattern> {
    let Expr::Call {
        receiver: Some(receiver),
        method,
        args,
    } = value
    else {
        return None;
    };
    if !matches!(receiver.as_ref(), Expr::Name(r) if r == "Math") || args.len() != 2 {
        return None;
    }
    let kind = match method.as_str() {
        "max" => ReducerKind::Max,
        "min" => ReducerKind::Min,
        _ => return None,
    };
    let is_acc = |e: &Expr| matches!(e, Expr::Name(n) if n == name);
    let other = if is_acc(&args[0]) {
        &args[1]
    } else if is_acc(&args[1]) {
        &args[0]
    } else {
        return None;
    };
    Some(ReducePattern {
        kind,
        accumulator: name.to_string(),
        acc_type,
        value: Some(other.clone()),
    })
}

/// The literal 1 in the form matching the accumulator's declared type, used
/// by the counting map stage inserted before a counting reduce.
pub fn typed_one(acc_type: Option<&TypeRef>) -> Expr {
    typed_literal(acc_type, 1)
}

fn typed_literal(acc_type: Option<&TypeRef>, n: i64) -> Expr {
    let Some(ty) = acc_type else {
        return Expr::Lit(Literal::Int(n));
    };
    match ty.raw_name() {
        "double" | "Double" => Expr::Lit(Literal::Float(n as f64)),
        "float" | "Float" => Expr::Lit(Literal::FloatSingle(n as f64)),
        "long" | "Long" => Expr::Lit(Literal::Long(n)),
        "byte" | "short" | "char" => Expr::Cast {
            ty: ty.clone(),
            expr: Box::new(Expr::Lit(Literal::Int(n))),
        },
        _ => Expr::Lit(Literal::Int(n)),
    }
}

/// Width-matched built-in sum reference, or an inline fold where none exists.
fn sum_reference(acc_type: Option<&TypeRef>) -> Expr {
    match acc_type.map(TypeRef::raw_name) {
        None | Some("int") | Some("Integer") => Expr::method_ref("Integer", "sum"),
        Some("long") | Some("Long") => Expr::method_ref("Long", "sum"),
        Some("double") | Some("Double") => Expr::method_ref("Double", "sum"),
        _ => binary_fold(BinaryOp::Add),
    }
}

/// Inline two-parameter fold: `(a, b) -> a <op> b`.
fn binary_fold(op: BinaryOp) -> Expr {
    Expr::lambda(
        vec!["a", "b"],
        Expr::binary(op, Expr::name("a"), Expr::name("b")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ScopeTypes;

    fn int_scope(name: &str, ty: &str) -> ScopeTypes {
        ScopeTypes::new().with(name, TypeRef::named(ty))
    }

    #[test]
    fn increment_forms() {
        let scope = int_scope("i", "int");
        for op in [UnaryOp::PostIncrement, UnaryOp::PreIncrement] {
            let stmt = Stmt::Expr(Expr::unary(op, Expr::name("i")));
            let pat = detect(&stmt, &scope).unwrap();
            assert_eq!(pat.kind, ReducerKind::Increment);
            assert_eq!(pat.accumulator, "i");
            assert!(pat.value.is_none());
        }
    }

    #[test]
    fn step_on_a_non_numeric_binding_is_not_a_reduce() {
        let scope = int_scope("s", "String");
        let stmt = Stmt::Expr(Expr::unary(UnaryOp::PostIncrement, Expr::name("s")));
        assert!(detect(&stmt, &scope).is_none());
    }

    #[test]
    fn decrement_includes_minus_assign_one() {
        let scope = int_scope("i", "int");
        let stmt = Stmt::Expr(Expr::assign(
            AssignOp::SubAssign,
            Expr::name("i"),
            Expr::int(1),
        ));
        assert_eq!(detect(&stmt, &scope).unwrap().kind, ReducerKind::Decrement);

        // i -= x is not a counting step
        let stmt = Stmt::Expr(Expr::assign(
            AssignOp::SubAssign,
            Expr::name("i"),
            Expr::name("x"),
        ));
        assert!(detect(&stmt, &scope).is_none());
    }

    #[test]
    fn add_assign_splits_on_accumulator_type() {
        let stmt = Stmt::Expr(Expr::assign(
            AssignOp::AddAssign,
            Expr::name("acc"),
            Expr::name("x"),
        ));
        assert_eq!(
            detect(&stmt, &int_scope("acc", "int")).unwrap().kind,
            ReducerKind::Sum
        );
        assert_eq!(
            detect(&stmt, &int_scope("acc", "String")).unwrap().kind,
            ReducerKind::StringConcat
        );
    }

    #[test]
    fn min_max_assignment_extracts_value_argument() {
        let scope = int_scope("m", "int");
        let update = Expr::assign(
            AssignOp::Set,
            Expr::name("m"),
            Expr::call(
                Some(Expr::name("Math")),
                "max",
                vec![Expr::name("m"), Expr::name("x")],
            ),
        );
        let pat = detect(&Stmt::Expr(update), &scope).unwrap();
        assert_eq!(pat.kind, ReducerKind::Max);
        assert_eq!(pat.value, Some(Expr::name("x")));
    }

    #[test]
    fn plain_assignment_is_not_a_reduce() {
        let scope = int_scope("m", "int");
        let stmt = Stmt::Expr(Expr::assign(
            AssignOp::Set,
            Expr::name("m"),
            Expr::name("x"),
        ));
        assert!(detect(&stmt, &scope).is_none());
    }

    #[test]
    fn identity_elements_match_declared_types() {
        let int_ty = TypeRef::named("int");
        let double_ty = TypeRef::named("double");
        let long_ty = TypeRef::named("long");
        let byte_ty = TypeRef::named("byte");

        assert_eq!(
            ReducerKind::Sum.identity_element(Some(&int_ty)),
            Some(Expr::Lit(Literal::Int(0)))
        );
        assert_eq!(
            ReducerKind::Sum.identity_element(Some(&double_ty)),
            Some(Expr::Lit(Literal::Float(0.0)))
        );
        assert_eq!(
            ReducerKind::Product.identity_element(Some(&long_ty)),
            Some(Expr::Lit(Literal::Long(1)))
        );
        assert!(matches!(
            ReducerKind::Increment.identity_element(Some(&byte_ty)),
            Some(Expr::Cast { .. })
        ));
        assert_eq!(
            ReducerKind::StringConcat.identity_element(None),
            Some(Expr::Lit(Literal::Str(String::new())))
        );
        assert_eq!(ReducerKind::Max.identity_element(Some(&int_ty)), None);
    }

    #[test]
    fn accumulator_functions_prefer_named_references() {
        let int_ty = TypeRef::named("int");
        let long_ty = TypeRef::named("long");
        assert_eq!(
            ReducerKind::Sum.accumulator_fn(Some(&int_ty)),
            Expr::method_ref("Integer", "sum")
        );
        assert_eq!(
            ReducerKind::Sum.accumulator_fn(Some(&long_ty)),
            Expr::method_ref("Long", "sum")
        );
        assert_eq!(
            ReducerKind::StringConcat.accumulator_fn(None),
            Expr::method_ref("String", "concat")
        );
        // narrow types fall back to an inline fold
        assert!(matches!(
            ReducerKind::Sum.accumulator_fn(Some(&TypeRef::named("short"))),
            Expr::Lambda { .. }
        ));
        assert!(matches!(
            ReducerKind::Product.accumulator_fn(Some(&int_ty)),
            Expr::Lambda { .. }
        ));
    }
}
