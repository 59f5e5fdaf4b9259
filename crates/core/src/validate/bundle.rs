//! Bundle validation: bundle-level logic, item `include` conditions, and
//! recursion into inline artifacts.

use super::{
    check_condition, logic::validate_logic_section, path_of, validate_artifact, Issues,
    ValidateOptions,
};
use crate::artifact::{Bundle, BundleItem, FieldMap};
use crate::environment::build_environment;
use crate::error::PathSegment;
use tracing::trace;

pub(super) fn validate_bundle(
    bundle: &Bundle,
    base: &[PathSegment],
    options: &ValidateOptions,
    issues: &mut Issues,
) {
    // Bundles declare no fields; only their own logic keys are in scope.
    let (env, order) = build_environment(&FieldMap::new(), &bundle.logic, options.max_depth);
    validate_logic_section(&bundle.logic, &order, &env, base, issues);

    for (idx, item) in bundle.contents.iter().enumerate() {
        if issues.done() {
            return;
        }
        trace!(item = item.key(), index = idx, "checking bundle item");
        let item_path = path_of(base, ["contents".into(), idx.into()]);
        check_condition(
            item.include(),
            path_of(&item_path, ["include".into()]),
            &env,
            issues,
        );
        if let BundleItem::Inline { artifact, .. } = item {
            let nested = path_of(&item_path, ["artifact".into()]);
            validate_artifact(artifact, &nested, options, issues);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::validate_logic;
    use super::*;
    use crate::artifact::{Artifact, Field, FieldType, Form, LogicEntry};
    use crate::error::{IssueCode, ValidationIssue};
    use serde_json::json;

    fn run(artifact: &Artifact, options: &ValidateOptions) -> Vec<ValidationIssue> {
        validate_logic(artifact, options).err().unwrap_or_default()
    }

    #[test]
    fn include_conditions_see_bundle_logic() {
        let v = json!({
            "kind": "bundle",
            "logic": {
                "isBusiness": { "type": "boolean", "value": "true" },
                "seats": { "type": "number", "value": "3" }
            },
            "contents": [
                { "type": "registry", "key": "w9", "slug": "irs/w9", "include": "isBusiness" },
                { "type": "registry", "key": "w8", "slug": "irs/w8", "include": "not isBusiness" },
                { "type": "path", "key": "seating", "path": "./s.json", "include": "seats" },
                { "type": "path", "key": "x", "path": "./x.json", "include": "fields.age.value > 1" }
            ]
        });
        let artifact = Artifact::from_json(&v).unwrap();
        let issues = run(&artifact, &ValidateOptions::default());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, IssueCode::BooleanContext);
        assert_eq!(issues[0].path_string(), "contents.2.include");
        assert_eq!(issues[1].code, IssueCode::UnknownVariable);
        assert_eq!(issues[1].path_string(), "contents.3.include");
    }

    #[test]
    fn inline_artifacts_use_their_own_environment() {
        let inner = Form::new()
            .field("age", Field::new(FieldType::Number))
            .field("note", Field::new(FieldType::Text).visible("isAdult and bundleFlag"))
            .logic("isAdult", LogicEntry::new(FieldType::Boolean, "fields.age.value >= 18"));
        let bundle = Bundle {
            logic: [(
                "bundleFlag".to_string(),
                LogicEntry::new(FieldType::Boolean, "true"),
            )]
            .into_iter()
            .collect(),
            contents: vec![BundleItem::Inline {
                key: "intake".into(),
                include: Some("bundleFlag".into()),
                artifact: Box::new(Artifact::Form(inner)),
            }],
            ..Bundle::default()
        };
        let issues = run(&Artifact::Bundle(bundle), &ValidateOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].path_string(),
            "contents.0.artifact.fields.note.visible"
        );
        assert_eq!(issues[0].variable.as_deref(), Some("bundleFlag"));
    }

    #[test]
    fn nested_bundles_recurse() {
        let v = json!({
            "kind": "bundle",
            "contents": [{
                "type": "inline",
                "key": "outer",
                "artifact": {
                    "kind": "bundle",
                    "logic": { "loop": { "type": "boolean", "value": "loop" } },
                    "contents": [{
                        "type": "inline",
                        "key": "doc",
                        "include": "loop",
                        "artifact": { "kind": "checklist", "items": [] }
                    }]
                }
            }]
        });
        let artifact = Artifact::from_json(&v).unwrap();
        let issues = run(&artifact, &ValidateOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::CircularDependency);
        assert_eq!(issues[0].path_string(), "contents.0.artifact.logic.loop");
    }

    #[test]
    fn first_error_mode_spans_nested_artifacts() {
        let v = json!({
            "kind": "bundle",
            "contents": [
                { "type": "inline", "key": "a", "artifact": {
                    "kind": "form",
                    "fields": { "f": { "type": "text", "visible": "ghostOne" } }
                }},
                { "type": "path", "key": "b", "path": "./b.json", "include": "ghostTwo" }
            ]
        });
        let artifact = Artifact::from_json(&v).unwrap();
        assert_eq!(run(&artifact, &ValidateOptions::default()).len(), 2);
        let options = ValidateOptions {
            collect_all_errors: false,
            ..ValidateOptions::default()
        };
        let issues = run(&artifact, &options);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].variable.as_deref(), Some("ghostOne"));
    }
}
