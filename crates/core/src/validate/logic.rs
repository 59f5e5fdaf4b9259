//! Logic-section checks: cycles, expression syntax and references,
//! object properties, and declared-versus-inferred types.

use super::{check_variables, parse_checked, path_of, Issues};
use crate::artifact::{LogicEntry, LogicSection, LogicValue};
use crate::dependency::TopologicalOrder;
use crate::environment::declared_value_type;
use crate::error::{IssueCode, PathSegment, ValidationIssue};
use crate::infer::infer_expression_type;
use crate::types::{InferredType, TypeEnvironment};

pub(super) fn validate_logic_section(
    logic: &LogicSection,
    order: &TopologicalOrder,
    env: &TypeEnvironment,
    base: &[PathSegment],
    issues: &mut Issues,
) {
    for key in &order.cyclic_keys {
        issues.push(ValidationIssue::new(
            IssueCode::CircularDependency,
            path_of(base, ["logic".into(), key.as_str().into()]),
            "circular dependency detected",
        ));
    }

    for (key, entry) in logic {
        if issues.done() {
            return;
        }
        let value_path = path_of(base, ["logic".into(), key.as_str().into(), "value".into()]);
        validate_entry(entry, order.is_cyclic(key), &value_path, env, issues);
    }
}

fn validate_entry(
    entry: &LogicEntry,
    cyclic: bool,
    value_path: &[PathSegment],
    env: &TypeEnvironment,
    issues: &mut Issues,
) {
    if let LogicValue::Bool(_) = entry.value {
        let declared = declared_value_type(entry, None);
        if declared != InferredType::Unknown && declared != InferredType::Boolean {
            issues.push(ValidationIssue::new(
                IssueCode::TypeMismatch,
                value_path.to_vec(),
                format!("declared type is {}, but value is a boolean literal", declared),
            ));
        }
        return;
    }

    for (sub, text) in entry.value.expressions() {
        let path = match sub {
            Some(s) => path_of(value_path, [s.into()]),
            None => value_path.to_vec(),
        };
        if let Some(s) = sub {
            if entry.declared_type.sub_property(s).is_none() {
                issues.push(
                    ValidationIssue::new(
                        IssueCode::UnknownProperty,
                        path.clone(),
                        format!(
                            "'{}' is not a property of type {}",
                            s,
                            entry.declared_type.name()
                        ),
                    )
                    .with_expression(text),
                );
            }
        }

        let Some(parsed) = parse_checked(text, &path, issues) else {
            continue;
        };
        check_variables(&parsed, text, &path, env, issues);
        if cyclic {
            continue;
        }

        let declared = declared_value_type(entry, sub);
        let inferred = infer_expression_type(&parsed.ast, env);
        if declared != InferredType::Unknown
            && inferred.is_confident()
            && !declared.accepts(inferred.ty)
        {
            issues.push(
                ValidationIssue::new(
                    IssueCode::TypeMismatch,
                    path,
                    format!(
                        "declared type is {}, but inferred type is {}",
                        declared, inferred.ty
                    ),
                )
                .with_expression(text),
            );
        }
    }
}
