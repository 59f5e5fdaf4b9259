use serde::{Deserialize, Serialize};
use std::fmt;

/// A syntax error in an expression. `offset` is a character offset into
/// the expression text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at offset {offset})")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            offset,
        }
    }
}

/// Input that cannot be validated at all. These are caller errors, not
/// validation findings.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact is not a JSON object.
    #[error("artifact must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The artifact object does not match the artifact model.
    #[error("invalid artifact: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ──────────────────────────────────────────────
// Validation issues
// ──────────────────────────────────────────────

/// Machine-readable classification of a [`ValidationIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    SyntaxError,
    UnknownVariable,
    CircularDependency,
    BooleanContext,
    TypeMismatch,
    UnknownProperty,
    NestingTooDeep,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::SyntaxError => "syntax_error",
            IssueCode::UnknownVariable => "unknown_variable",
            IssueCode::CircularDependency => "circular_dependency",
            IssueCode::BooleanContext => "boolean_context",
            IssueCode::TypeMismatch => "type_mismatch",
            IssueCode::UnknownProperty => "unknown_property",
            IssueCode::NestingTooDeep => "nesting_too_deep",
        }
    }
}

/// One segment of an issue path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        PathSegment::Key(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => write!(f, "{}", k),
        }
    }
}

/// A single logic validation finding, located within the artifact by `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        ValidationIssue {
            code,
            message: message.into(),
            path,
            expression: None,
            variable: None,
        }
    }

    pub fn with_expression(mut self, expression: &str) -> Self {
        self.expression = Some(expression.to_owned());
        self
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = Some(variable.to_owned());
        self
    }

    /// Dotted rendering of `path`, e.g. `fields.age.required`.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.message)
    }
}
