//! Logic validation: conditional expressions, named logic keys, and
//! dependency cycles across a whole artifact.
//!
//! Issues are data. The only errors returned as `Err` in the Rust sense are
//! for input that is not an artifact at all ([`ArtifactError`]).

mod bundle;
mod form;
mod logic;

use crate::artifact::{Artifact, CondExpr};
use crate::error::{ArtifactError, IssueCode, PathSegment, ValidationIssue};
use crate::field_paths::DEFAULT_MAX_DEPTH;
use crate::infer::infer_expression_type;
use crate::parser::{parse_expression, ParsedExpression};
use crate::types::{InferredType, TypeEnvironment};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Options for [`validate_logic`]. Missing keys take their defaults, so a
/// partial config table deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateOptions {
    /// Keep going after the first issue.
    pub collect_all_errors: bool,
    /// Deepest fieldset nesting that is descended into.
    pub max_depth: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            collect_all_errors: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of validating untyped input: `{"value": ...}` or `{"issues": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicReport {
    Value(serde_json::Value),
    Issues(Vec<ValidationIssue>),
}

impl LogicReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, LogicReport::Value(_))
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            LogicReport::Value(_) => &[],
            LogicReport::Issues(issues) => issues,
        }
    }
}

/// Validate every expression in `artifact`. Returns the artifact unchanged
/// when no issues are found.
pub fn validate_logic<'a>(
    artifact: &'a Artifact,
    options: &ValidateOptions,
) -> Result<&'a Artifact, Vec<ValidationIssue>> {
    let mut issues = Issues::new(options.collect_all_errors);
    validate_artifact(artifact, &[], options, &mut issues);
    let issues = issues.into_vec();
    debug!(issues = issues.len(), "logic validation finished");
    if issues.is_empty() {
        Ok(artifact)
    } else {
        Err(issues)
    }
}

/// Deserialize `value` as an artifact and validate it.
pub fn validate_logic_value(
    value: &serde_json::Value,
    options: &ValidateOptions,
) -> Result<LogicReport, ArtifactError> {
    let artifact = Artifact::from_json(value)?;
    Ok(match validate_logic(&artifact, options) {
        Ok(_) => LogicReport::Value(value.clone()),
        Err(issues) => LogicReport::Issues(issues),
    })
}

pub(crate) fn validate_artifact(
    artifact: &Artifact,
    base: &[PathSegment],
    options: &ValidateOptions,
    issues: &mut Issues,
) {
    match artifact {
        Artifact::Form(f) => form::validate_form(f, base, options, issues),
        Artifact::Bundle(b) => bundle::validate_bundle(b, base, options, issues),
        Artifact::Document(_) | Artifact::Checklist(_) => {}
    }
}

// ──────────────────────────────────────────────
// Issue collection
// ──────────────────────────────────────────────

/// Accumulates issues; in first-error mode it stops accepting after one.
pub(crate) struct Issues {
    list: Vec<ValidationIssue>,
    collect_all: bool,
}

impl Issues {
    pub(crate) fn new(collect_all: bool) -> Self {
        Issues {
            list: Vec::new(),
            collect_all,
        }
    }

    pub(crate) fn push(&mut self, issue: ValidationIssue) {
        if !self.done() {
            self.list.push(issue);
        }
    }

    /// True once nothing more will be recorded.
    pub(crate) fn done(&self) -> bool {
        !self.collect_all && !self.list.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<ValidationIssue> {
        self.list
    }
}

pub(crate) fn path_of(
    base: &[PathSegment],
    tail: impl IntoIterator<Item = PathSegment>,
) -> Vec<PathSegment> {
    let mut path = base.to_vec();
    path.extend(tail);
    path
}

// ──────────────────────────────────────────────
// Shared expression checks
// ──────────────────────────────────────────────

/// Parse `text`, recording a syntax issue on failure.
pub(crate) fn parse_checked(
    text: &str,
    path: &[PathSegment],
    issues: &mut Issues,
) -> Option<ParsedExpression> {
    trace!(path = ?path, expression = text, "checking expression");
    match parse_expression(text) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            issues.push(
                ValidationIssue::new(
                    IssueCode::SyntaxError,
                    path.to_vec(),
                    format!("syntax error: {}", e),
                )
                .with_expression(text),
            );
            None
        }
    }
}

/// Report each referenced name that is neither a variable nor a built-in.
pub(crate) fn check_variables(
    parsed: &ParsedExpression,
    text: &str,
    path: &[PathSegment],
    env: &TypeEnvironment,
    issues: &mut Issues,
) {
    for name in &parsed.variables {
        if !env.is_known(name) {
            issues.push(
                ValidationIssue::new(
                    IssueCode::UnknownVariable,
                    path.to_vec(),
                    format!("unknown variable '{}'", name),
                )
                .with_expression(text)
                .with_variable(name),
            );
        }
    }
}

/// Check a `required` / `visible` / `include` condition. Boolean literals
/// are always valid; an expression must not confidently infer to anything
/// other than boolean.
pub(crate) fn check_condition(
    cond: Option<&CondExpr>,
    path: Vec<PathSegment>,
    env: &TypeEnvironment,
    issues: &mut Issues,
) {
    let Some(CondExpr::Expr(text)) = cond else {
        return;
    };
    if issues.done() {
        return;
    }
    let Some(parsed) = parse_checked(text, &path, issues) else {
        return;
    };
    check_variables(&parsed, text, &path, env, issues);

    let inferred = infer_expression_type(&parsed.ast, env);
    if inferred.is_confident() && inferred.ty != InferredType::Boolean {
        issues.push(
            ValidationIssue::new(
                IssueCode::BooleanContext,
                path,
                format!(
                    "expression must resolve to boolean, but inferred type is {}",
                    inferred.ty
                ),
            )
            .with_expression(text),
        );
    }
}
