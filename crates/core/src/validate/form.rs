//! Form validation: fieldset depth, logic section, field and annex
//! conditions.

use super::{check_condition, logic::validate_logic_section, path_of, Issues, ValidateOptions};
use crate::artifact::{FieldMap, FieldType, Form};
use crate::environment::build_environment;
use crate::error::{IssueCode, PathSegment, ValidationIssue};
use crate::types::TypeEnvironment;

pub(super) fn validate_form(
    form: &Form,
    base: &[PathSegment],
    options: &ValidateOptions,
    issues: &mut Issues,
) {
    check_depth(
        &form.fields,
        &path_of(base, [PathSegment::from("fields")]),
        0,
        options.max_depth,
        issues,
    );

    let (env, order) = build_environment(&form.fields, &form.logic, options.max_depth);
    validate_logic_section(&form.logic, &order, &env, base, issues);

    validate_fields(
        &form.fields,
        &path_of(base, [PathSegment::from("fields")]),
        0,
        options.max_depth,
        &env,
        issues,
    );

    for (idx, annex) in form.annexes.iter().enumerate() {
        let annex_path = path_of(base, ["annexes".into(), idx.into()]);
        check_condition(
            annex.required.as_ref(),
            path_of(&annex_path, ["required".into()]),
            &env,
            issues,
        );
        check_condition(
            annex.visible.as_ref(),
            path_of(&annex_path, ["visible".into()]),
            &env,
            issues,
        );
    }
}

/// `fields_path` points at the map itself (`[..., "fields"]`).
fn check_depth(
    fields: &FieldMap,
    fields_path: &[PathSegment],
    depth: usize,
    max_depth: usize,
    issues: &mut Issues,
) {
    for (id, field) in fields {
        if field.field_type != FieldType::Fieldset {
            continue;
        }
        let field_path = path_of(fields_path, [id.as_str().into()]);
        if depth + 1 > max_depth {
            issues.push(ValidationIssue::new(
                IssueCode::NestingTooDeep,
                field_path,
                format!(
                    "fieldset nesting exceeds the maximum depth of {}",
                    max_depth
                ),
            ));
            continue;
        }
        check_depth(
            &field.fields,
            &path_of(&field_path, ["fields".into()]),
            depth + 1,
            max_depth,
            issues,
        );
    }
}

fn validate_fields(
    fields: &FieldMap,
    fields_path: &[PathSegment],
    depth: usize,
    max_depth: usize,
    env: &TypeEnvironment,
    issues: &mut Issues,
) {
    for (id, field) in fields {
        if issues.done() {
            return;
        }
        let field_path = path_of(fields_path, [id.as_str().into()]);
        check_condition(
            field.required.as_ref(),
            path_of(&field_path, ["required".into()]),
            env,
            issues,
        );
        check_condition(
            field.visible.as_ref(),
            path_of(&field_path, ["visible".into()]),
            env,
            issues,
        );
        if field.field_type == FieldType::Fieldset && depth < max_depth {
            validate_fields(
                &field.fields,
                &path_of(&field_path, ["fields".into()]),
                depth + 1,
                max_depth,
                env,
                issues,
            );
        }
    }
}
