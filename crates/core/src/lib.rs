//! formlogic-core: expression parsing, type inference and logic
//! validation for form and bundle artifacts.
//!
//! Conditional expressions (`required`, `visible`, `include`) and named
//! logic keys are parsed into an AST, typed against an environment built
//! from the artifact's fields and logic section, and checked: conditions
//! must resolve to boolean, references must exist, and logic keys must not
//! depend on themselves.
//!
//! # Public API
//!
//! - [`validate_logic()`] / [`validate_logic_value()`] -- validate a whole artifact
//! - [`parse_expression()`] -- parse one expression
//! - [`build_type_environment()`] -- field paths and logic keys with types
//! - [`infer_expression_type()`] -- type of one expression in an environment
//! - [`infer_expression_text()`] -- parse and infer in one step
//! - [`topological_sort_logic_keys()`] -- evaluation order and cycles
//! - [`collect_field_paths()`] / [`collect_field_ids()`] -- runtime paths of a field tree

pub mod artifact;
pub mod ast;
pub mod dependency;
pub mod environment;
pub mod error;
pub mod field_paths;
pub mod infer;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use artifact::{
    Annex, Artifact, Bundle, BundleItem, CondExpr, Field, FieldMap, FieldType, Form,
    LogicEntry, LogicSection, LogicValue,
};
pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use dependency::{DependencyGraph, TopologicalOrder};
pub use error::{ArtifactError, IssueCode, ParseError, PathSegment, ValidationIssue};
pub use parser::ParsedExpression;
pub use types::{Confidence, InferredType, TypeEnvironment, TypeInference};
pub use validate::{LogicReport, ValidateOptions};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use dependency::{build_dependency_graph, topological_sort_logic_keys};
pub use environment::{build_type_environment, build_type_environment_with_depth};
pub use field_paths::{collect_field_ids, collect_field_paths, collect_field_types};
pub use infer::{infer_expression_text, infer_expression_type};
pub use parser::parse_expression;
pub use validate::{validate_logic, validate_logic_value};
