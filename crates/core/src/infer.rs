//! Type inference over expression ASTs.
//!
//! A bottom-up walk that never fails: anything it cannot characterize
//! becomes `Unknown` with `Unknown` confidence. Operand mismatches are not
//! reported here; only the expression's own result type is inferred.

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::ParseError;
use crate::parser::parse_expression;
use crate::types::{Confidence, InferredType, TypeEnvironment, TypeInference};

pub fn infer_expression_type(ast: &Expr, env: &TypeEnvironment) -> TypeInference {
    match ast {
        Expr::Literal { value, .. } => TypeInference::certain(match value {
            Literal::Bool(_) => InferredType::Boolean,
            Literal::Number(_) => InferredType::Number,
            Literal::Str(_) => InferredType::String,
        }),
        Expr::Variable { name, .. } => env.get(name).unwrap_or(TypeInference::UNKNOWN),
        Expr::Unary { op, operand, .. } => {
            let inner = infer_expression_type(operand, env);
            match op {
                UnaryOp::Not => TypeInference {
                    ty: InferredType::Boolean,
                    confidence: inner.confidence,
                },
                UnaryOp::Neg if inner.ty.is_numeric() => inner,
                UnaryOp::Neg => TypeInference::UNKNOWN,
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => infer_binary(*op, left, right, env),
        // A call with the wrong number of arguments abstains.
        Expr::Call { name, args, .. } => match env.function(name) {
            Some(sig)
                if sig.returns != InferredType::Unknown && sig.accepts_arity(args.len()) =>
            {
                TypeInference::certain(sig.returns)
            }
            _ => TypeInference::UNKNOWN,
        },
    }
}

/// Parse `text` and infer its type.
pub fn infer_expression_text(
    text: &str,
    env: &TypeEnvironment,
) -> Result<TypeInference, ParseError> {
    let parsed = parse_expression(text)?;
    Ok(infer_expression_type(&parsed.ast, env))
}

fn infer_binary(op: BinaryOp, left: &Expr, right: &Expr, env: &TypeEnvironment) -> TypeInference {
    if op.is_comparison() {
        return TypeInference::certain(InferredType::Boolean);
    }

    let l = infer_expression_type(left, env);
    let r = infer_expression_type(right, env);
    let confidence = weaker(l.confidence, r.confidence);

    if op.is_logical() {
        return TypeInference {
            ty: InferredType::Boolean,
            confidence,
        };
    }

    // Arithmetic. Integer operands widen to number.
    let ty = match (l.ty, r.ty) {
        (a, b) if a.is_numeric() && b.is_numeric() => InferredType::Number,
        (InferredType::String, InferredType::String) if op == BinaryOp::Add => {
            InferredType::String
        }
        _ => return TypeInference::UNKNOWN,
    };
    TypeInference { ty, confidence }
}

pub fn weaker(a: Confidence, b: Confidence) -> Confidence {
    a.min(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectKind;

    fn env() -> TypeEnvironment {
        let mut env = TypeEnvironment::new();
        env.insert(
            "fields.age.value",
            TypeInference::certain(InferredType::Number),
        );
        env.insert(
            "fields.name.value",
            TypeInference::certain(InferredType::String),
        );
        env.insert(
            "fields.rating.value",
            TypeInference::certain(InferredType::Integer),
        );
        env.insert(
            "fields.price.value",
            TypeInference::certain(InferredType::Object(ObjectKind::Money)),
        );
        env.insert("isAdult", TypeInference::inferred(InferredType::Boolean));
        env.insert("total", TypeInference::inferred(InferredType::Number));
        env.insert("loop", TypeInference::UNKNOWN);
        env
    }

    fn infer(src: &str) -> TypeInference {
        infer_expression_text(src, &env())
            .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", src, e))
    }

    fn t(ty: InferredType, confidence: Confidence) -> TypeInference {
        TypeInference { ty, confidence }
    }

    #[test]
    fn literals_are_certain() {
        assert_eq!(infer("true"), TypeInference::certain(InferredType::Boolean));
        assert_eq!(infer("42"), TypeInference::certain(InferredType::Number));
        assert_eq!(infer("'x'"), TypeInference::certain(InferredType::String));
    }

    #[test]
    fn variables_come_from_the_environment() {
        assert_eq!(
            infer("fields.age.value"),
            TypeInference::certain(InferredType::Number)
        );
        assert_eq!(
            infer("isAdult"),
            TypeInference::inferred(InferredType::Boolean)
        );
        assert_eq!(infer("nobodyDeclaredThis"), TypeInference::UNKNOWN);
    }

    #[test]
    fn comparison_is_always_certain_boolean() {
        assert_eq!(
            infer("fields.age.value >= 18"),
            TypeInference::certain(InferredType::Boolean)
        );
        // Heterogeneous operands are not this layer's concern.
        assert_eq!(
            infer("fields.name.value == 3"),
            TypeInference::certain(InferredType::Boolean)
        );
        assert_eq!(
            infer("mystery != loop"),
            TypeInference::certain(InferredType::Boolean)
        );
    }

    #[test]
    fn not_keeps_operand_confidence() {
        assert_eq!(infer("not true"), t(InferredType::Boolean, Confidence::Certain));
        assert_eq!(infer("!isAdult"), t(InferredType::Boolean, Confidence::Inferred));
        assert_eq!(infer("not loop"), t(InferredType::Boolean, Confidence::Unknown));
    }

    #[test]
    fn logical_connectives_take_weaker_confidence() {
        assert_eq!(
            infer("true and isAdult"),
            t(InferredType::Boolean, Confidence::Inferred)
        );
        assert_eq!(
            infer("loop or true"),
            t(InferredType::Boolean, Confidence::Unknown)
        );
        assert_eq!(
            infer("true or false"),
            t(InferredType::Boolean, Confidence::Certain)
        );
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            infer("fields.age.value + 1"),
            t(InferredType::Number, Confidence::Certain)
        );
        assert_eq!(
            infer("total * 2"),
            t(InferredType::Number, Confidence::Inferred)
        );
        assert_eq!(
            infer("fields.rating.value + fields.rating.value"),
            t(InferredType::Number, Confidence::Certain)
        );
        assert_eq!(
            infer("fields.rating.value * 2"),
            t(InferredType::Number, Confidence::Certain)
        );
        assert_eq!(
            infer("fields.rating.value / fields.rating.value"),
            t(InferredType::Number, Confidence::Certain)
        );
        assert_eq!(
            infer("fields.name.value + 'suffix'"),
            t(InferredType::String, Confidence::Certain)
        );
        assert_eq!(infer("fields.name.value - 'x'"), TypeInference::UNKNOWN);
        assert_eq!(infer("fields.price.value + 1"), TypeInference::UNKNOWN);
        assert_eq!(infer("loop + 1"), TypeInference::UNKNOWN);
    }

    #[test]
    fn negation() {
        assert_eq!(
            infer("-fields.age.value"),
            TypeInference::certain(InferredType::Number)
        );
        assert_eq!(infer("-'x'"), TypeInference::UNKNOWN);
    }

    #[test]
    fn calls_use_builtin_signatures() {
        assert_eq!(
            infer("isEmpty(loop)"),
            TypeInference::certain(InferredType::Boolean)
        );
        assert_eq!(
            infer("length(fields.name.value)"),
            TypeInference::certain(InferredType::Integer)
        );
        assert_eq!(infer("today()"), TypeInference::certain(InferredType::Date));
        assert_eq!(infer("frobnicate(1)"), TypeInference::UNKNOWN);
        assert_eq!(infer("if(isAdult, 1, 2)"), TypeInference::UNKNOWN);
    }

    #[test]
    fn calls_with_wrong_arity_abstain() {
        assert_eq!(infer("today(1)"), TypeInference::UNKNOWN);
        assert_eq!(infer("xor(isAdult)"), TypeInference::UNKNOWN);
        assert_eq!(infer("abs()"), TypeInference::UNKNOWN);
        assert_eq!(
            infer("max(1, 2, 3, 4)"),
            TypeInference::certain(InferredType::Number)
        );
    }

    #[test]
    fn integer_field_keeps_its_type_until_combined() {
        assert_eq!(
            infer("fields.rating.value"),
            TypeInference::certain(InferredType::Integer)
        );
        assert_eq!(
            infer("-fields.rating.value"),
            TypeInference::certain(InferredType::Integer)
        );
    }

    #[test]
    fn unknown_combines_predictably_under_and() {
        let r = infer("loop and isAdult");
        assert_eq!(r.ty, InferredType::Boolean);
        assert_eq!(r.confidence, Confidence::Unknown);
    }
}
