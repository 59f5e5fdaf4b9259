//! Artifact model: the parsed form/bundle tree handed to the logic validator.
//!
//! Structural validity is the caller's concern; these types only carry what
//! logic validation reads. Unknown keys are ignored on deserialization.
//! Maps preserve declaration order so issue order follows the source.

use crate::error::ArtifactError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered map of field id to definition.
pub type FieldMap = IndexMap<String, Field>;
/// Ordered map of logic key name to entry.
pub type LogicSection = IndexMap<String, LogicEntry>;

// ──────────────────────────────────────────────
// Conditional expressions
// ──────────────────────────────────────────────

/// `required` / `visible` / `include`: a boolean literal or an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CondExpr {
    Bool(bool),
    Expr(String),
}

impl From<bool> for CondExpr {
    fn from(b: bool) -> Self {
        CondExpr::Bool(b)
    }
}

impl From<&str> for CondExpr {
    fn from(s: &str) -> Self {
        CondExpr::Expr(s.to_owned())
    }
}

// ──────────────────────────────────────────────
// Fields
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Uuid,
    Uri,
    Enum,
    Boolean,
    Number,
    Percentage,
    Rating,
    Date,
    Datetime,
    Time,
    Duration,
    Money,
    Address,
    Phone,
    Coordinate,
    Bbox,
    Person,
    Organization,
    Identification,
    Multiselect,
    Fieldset,
    /// Any type this crate does not know; its value type is unknown.
    #[serde(other)]
    Other,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Uuid => "uuid",
            FieldType::Uri => "uri",
            FieldType::Enum => "enum",
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Percentage => "percentage",
            FieldType::Rating => "rating",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Time => "time",
            FieldType::Duration => "duration",
            FieldType::Money => "money",
            FieldType::Address => "address",
            FieldType::Phone => "phone",
            FieldType::Coordinate => "coordinate",
            FieldType::Bbox => "bbox",
            FieldType::Person => "person",
            FieldType::Organization => "organization",
            FieldType::Identification => "identification",
            FieldType::Multiselect => "multiselect",
            FieldType::Fieldset => "fieldset",
            FieldType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<CondExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<CondExpr>,
    /// Child fields; only meaningful for `fieldset`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: FieldMap,
}

impl Field {
    pub fn new(field_type: FieldType) -> Self {
        Field {
            field_type,
            label: None,
            description: None,
            required: None,
            visible: None,
            fields: IndexMap::new(),
        }
    }

    pub fn required(mut self, expr: impl Into<CondExpr>) -> Self {
        self.required = Some(expr.into());
        self
    }

    pub fn visible(mut self, expr: impl Into<CondExpr>) -> Self {
        self.visible = Some(expr.into());
        self
    }

    pub fn child(mut self, id: &str, field: Field) -> Self {
        self.fields.insert(id.to_owned(), field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annex {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<CondExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<CondExpr>,
}

// ──────────────────────────────────────────────
// Logic section
// ──────────────────────────────────────────────

/// A named, typed expression. The declared type is the author's claim;
/// inference cross-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicEntry {
    #[serde(rename = "type")]
    pub declared_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: LogicValue,
}

impl LogicEntry {
    pub fn new(declared_type: FieldType, value: impl Into<LogicValue>) -> Self {
        LogicEntry {
            declared_type,
            label: None,
            description: None,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogicValue {
    Bool(bool),
    Expr(String),
    /// Object-typed value whose leaves are expressions, e.g.
    /// `{ "amount": "fields.price.value.amount * 2", "currency": "'USD'" }`.
    Object(IndexMap<String, String>),
}

impl From<&str> for LogicValue {
    fn from(s: &str) -> Self {
        LogicValue::Expr(s.to_owned())
    }
}

impl From<bool> for LogicValue {
    fn from(b: bool) -> Self {
        LogicValue::Bool(b)
    }
}

impl LogicValue {
    /// `(sub-property, expression)` pairs; sub-property is `None` for a
    /// scalar expression.
    pub fn expressions(&self) -> Vec<(Option<&str>, &str)> {
        match self {
            LogicValue::Bool(_) => Vec::new(),
            LogicValue::Expr(e) => vec![(None, e.as_str())],
            LogicValue::Object(props) => props
                .iter()
                .map(|(k, v)| (Some(k.as_str()), v.as_str()))
                .collect(),
        }
    }
}

// ──────────────────────────────────────────────
// Artifacts
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annexes: Vec<Annex>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub logic: LogicSection,
}

impl Form {
    pub fn new() -> Self {
        Form::default()
    }

    pub fn field(mut self, id: &str, field: Field) -> Self {
        self.fields.insert(id.to_owned(), field);
        self
    }

    pub fn logic(mut self, name: &str, entry: LogicEntry) -> Self {
        self.logic.insert(name.to_owned(), entry);
        self
    }

    pub fn annex(mut self, annex: Annex) -> Self {
        self.annexes.push(annex);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub logic: LogicSection,
    #[serde(default)]
    pub contents: Vec<BundleItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BundleItem {
    Inline {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include: Option<CondExpr>,
        artifact: Box<Artifact>,
    },
    Path {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include: Option<CondExpr>,
        path: String,
    },
    Registry {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include: Option<CondExpr>,
        slug: String,
    },
}

impl BundleItem {
    pub fn key(&self) -> &str {
        match self {
            BundleItem::Inline { key, .. }
            | BundleItem::Path { key, .. }
            | BundleItem::Registry { key, .. } => key,
        }
    }

    pub fn include(&self) -> Option<&CondExpr> {
        match self {
            BundleItem::Inline { include, .. }
            | BundleItem::Path { include, .. }
            | BundleItem::Registry { include, .. } => include.as_ref(),
        }
    }
}

/// Artifacts without logic (documents, checklists) are carried opaquely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpaqueArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Artifact {
    Form(Form),
    Bundle(Bundle),
    Document(OpaqueArtifact),
    Checklist(OpaqueArtifact),
}

impl Artifact {
    /// Deserialize an artifact from untyped JSON.
    pub fn from_json(value: &serde_json::Value) -> Result<Artifact, ArtifactError> {
        if !value.is_object() {
            return Err(ArtifactError::NotAnObject(json_kind(value)));
        }
        Ok(Artifact::deserialize(value)?)
    }

    /// The logic section, if this artifact kind has one.
    pub fn logic(&self) -> Option<&LogicSection> {
        match self {
            Artifact::Form(f) => Some(&f.logic),
            Artifact::Bundle(b) => Some(&b.logic),
            _ => None,
        }
    }

    /// Field definitions; bundles and opaque artifacts have none.
    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            Artifact::Form(f) => Some(&f.fields),
            _ => None,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_deserializes_with_conditions_and_logic() {
        let v = json!({
            "kind": "form",
            "name": "signup",
            "fields": {
                "age": { "type": "number", "required": true },
                "guardian": { "type": "text", "visible": "not isAdult" },
                "applicant": {
                    "type": "fieldset",
                    "fields": { "name": { "type": "text" } }
                }
            },
            "logic": {
                "isAdult": { "type": "boolean", "value": "fields.age.value >= 18" },
                "fee": { "type": "money", "value": { "amount": "10", "currency": "'USD'" } }
            },
            "annexes": [ { "id": "passport", "required": "isAdult" } ]
        });
        let artifact = Artifact::from_json(&v).expect("valid form");
        let Artifact::Form(form) = artifact else {
            panic!("expected form");
        };
        assert_eq!(
            form.fields.keys().collect::<Vec<_>>(),
            vec!["age", "guardian", "applicant"]
        );
        assert_eq!(form.fields["age"].required, Some(CondExpr::Bool(true)));
        assert_eq!(
            form.fields["guardian"].visible,
            Some(CondExpr::Expr("not isAdult".into()))
        );
        assert_eq!(form.fields["applicant"].fields.len(), 1);
        assert!(matches!(form.logic["fee"].value, LogicValue::Object(_)));
        assert_eq!(form.annexes[0].id, "passport");
    }

    #[test]
    fn unknown_field_type_is_other() {
        let f: Field = serde_json::from_value(json!({ "type": "signature" })).unwrap();
        assert_eq!(f.field_type, FieldType::Other);
    }

    #[test]
    fn bundle_items_are_tagged_by_type() {
        let v = json!({
            "kind": "bundle",
            "contents": [
                { "type": "inline", "key": "a", "include": "x", "artifact": { "kind": "form" } },
                { "type": "path", "key": "b", "path": "./b.json" },
                { "type": "registry", "key": "c", "slug": "acme/c", "include": false }
            ]
        });
        let Artifact::Bundle(b) = Artifact::from_json(&v).unwrap() else {
            panic!("expected bundle");
        };
        assert_eq!(b.contents.len(), 3);
        assert_eq!(b.contents[0].include(), Some(&CondExpr::Expr("x".into())));
        assert_eq!(b.contents[1].include(), None);
        assert_eq!(b.contents[2].key(), "c");
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = Artifact::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ArtifactError::NotAnObject("array")));
        let err = Artifact::from_json(&json!({ "kind": "spaceship" })).unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed(_)));
    }

    #[test]
    fn logic_value_expressions() {
        let v = LogicValue::Object(IndexMap::from([
            ("amount".to_string(), "1".to_string()),
            ("currency".to_string(), "'EUR'".to_string()),
        ]));
        assert_eq!(
            v.expressions(),
            vec![(Some("amount"), "1"), (Some("currency"), "'EUR'")]
        );
        assert!(LogicValue::Bool(true).expressions().is_empty());
    }
}
