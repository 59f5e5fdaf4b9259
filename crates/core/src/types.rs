//! Inferred types, confidence levels, and the static type tables:
//! field type -> value type, composite sub-properties, and built-in
//! function signatures.

use crate::artifact::FieldType;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

// ──────────────────────────────────────────────
// Inferred types
// ──────────────────────────────────────────────

/// Shape of an object-valued type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Money,
    Address,
    Phone,
    Coordinate,
    Bbox,
    Person,
    Organization,
    Identification,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Money => "money",
            ObjectKind::Address => "address",
            ObjectKind::Phone => "phone",
            ObjectKind::Coordinate => "coordinate",
            ObjectKind::Bbox => "bbox",
            ObjectKind::Person => "person",
            ObjectKind::Organization => "organization",
            ObjectKind::Identification => "identification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferredType {
    Boolean,
    String,
    Number,
    Integer,
    Date,
    Datetime,
    Time,
    Duration,
    Object(ObjectKind),
    /// Multi-valued selection; elements are strings.
    List,
    /// Inference abstained.
    Unknown,
}

impl InferredType {
    pub fn is_numeric(self) -> bool {
        matches!(self, InferredType::Number | InferredType::Integer)
    }

    /// Whether a value inferred as `actual` satisfies a declared `self`.
    /// Numeric types are mutually compatible.
    pub fn accepts(self, actual: InferredType) -> bool {
        self == actual || (self.is_numeric() && actual.is_numeric())
    }
}

/// Serializes as its display name (`"number"`, `"money"`, ...).
impl Serialize for InferredType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InferredType::Boolean => "boolean",
            InferredType::String => "string",
            InferredType::Number => "number",
            InferredType::Integer => "integer",
            InferredType::Date => "date",
            InferredType::Datetime => "datetime",
            InferredType::Time => "time",
            InferredType::Duration => "duration",
            InferredType::Object(kind) => kind.name(),
            InferredType::List => "list",
            InferredType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// How sure the inferrer is. Ordered weakest first, so `min` picks the
/// weaker of two confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Unknown,
    Inferred,
    Certain,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Unknown => "unknown",
            Confidence::Inferred => "inferred",
            Confidence::Certain => "certain",
        })
    }
}

/// A type together with the confidence it was inferred with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeInference {
    #[serde(rename = "type")]
    pub ty: InferredType,
    pub confidence: Confidence,
}

impl TypeInference {
    pub const UNKNOWN: TypeInference = TypeInference {
        ty: InferredType::Unknown,
        confidence: Confidence::Unknown,
    };

    pub fn certain(ty: InferredType) -> Self {
        TypeInference {
            ty,
            confidence: Confidence::Certain,
        }
    }

    pub fn inferred(ty: InferredType) -> Self {
        TypeInference {
            ty,
            confidence: Confidence::Inferred,
        }
    }

    /// True when the type is known with certain or inferred confidence.
    pub fn is_confident(&self) -> bool {
        self.ty != InferredType::Unknown && self.confidence != Confidence::Unknown
    }
}

// ──────────────────────────────────────────────
// Field type tables
// ──────────────────────────────────────────────

const DURATION_PROPS: &[(&str, InferredType)] = &[
    ("years", InferredType::Number),
    ("months", InferredType::Number),
    ("weeks", InferredType::Number),
    ("days", InferredType::Number),
    ("hours", InferredType::Number),
    ("minutes", InferredType::Number),
    ("seconds", InferredType::Number),
];

const MONEY_PROPS: &[(&str, InferredType)] = &[
    ("amount", InferredType::Number),
    ("currency", InferredType::String),
];

const ADDRESS_PROPS: &[(&str, InferredType)] = &[
    ("line1", InferredType::String),
    ("line2", InferredType::String),
    ("locality", InferredType::String),
    ("region", InferredType::String),
    ("postalCode", InferredType::String),
    ("country", InferredType::String),
];

const PHONE_PROPS: &[(&str, InferredType)] = &[
    ("number", InferredType::String),
    ("type", InferredType::String),
    ("extension", InferredType::String),
];

const COORDINATE_PROPS: &[(&str, InferredType)] = &[
    ("lat", InferredType::Number),
    ("lon", InferredType::Number),
];

const BBOX_PROPS: &[(&str, InferredType)] = &[
    ("north", InferredType::Number),
    ("south", InferredType::Number),
    ("east", InferredType::Number),
    ("west", InferredType::Number),
];

const PERSON_PROPS: &[(&str, InferredType)] = &[
    ("fullName", InferredType::String),
    ("firstName", InferredType::String),
    ("middleName", InferredType::String),
    ("lastName", InferredType::String),
    ("suffix", InferredType::String),
    ("title", InferredType::String),
];

const ORGANIZATION_PROPS: &[(&str, InferredType)] = &[
    ("name", InferredType::String),
    ("legalName", InferredType::String),
    ("entityType", InferredType::String),
    ("domicile", InferredType::String),
];

const IDENTIFICATION_PROPS: &[(&str, InferredType)] = &[
    ("idType", InferredType::String),
    ("idNumber", InferredType::String),
    ("issuingAuthority", InferredType::String),
    ("issuedDate", InferredType::Date),
    ("expiryDate", InferredType::Date),
];

impl FieldType {
    /// Type of the field's runtime `.value`.
    pub fn value_type(self) -> InferredType {
        match self {
            FieldType::Text
            | FieldType::Email
            | FieldType::Uuid
            | FieldType::Uri
            | FieldType::Enum => InferredType::String,
            FieldType::Boolean => InferredType::Boolean,
            FieldType::Number | FieldType::Percentage => InferredType::Number,
            FieldType::Rating => InferredType::Integer,
            FieldType::Date => InferredType::Date,
            FieldType::Datetime => InferredType::Datetime,
            FieldType::Time => InferredType::Time,
            FieldType::Duration => InferredType::Duration,
            FieldType::Money => InferredType::Object(ObjectKind::Money),
            FieldType::Address => InferredType::Object(ObjectKind::Address),
            FieldType::Phone => InferredType::Object(ObjectKind::Phone),
            FieldType::Coordinate => InferredType::Object(ObjectKind::Coordinate),
            FieldType::Bbox => InferredType::Object(ObjectKind::Bbox),
            FieldType::Person => InferredType::Object(ObjectKind::Person),
            FieldType::Organization => InferredType::Object(ObjectKind::Organization),
            FieldType::Identification => InferredType::Object(ObjectKind::Identification),
            FieldType::Multiselect => InferredType::List,
            FieldType::Fieldset | FieldType::Other => InferredType::Unknown,
        }
    }

    /// Addressable sub-properties of a composite value, with their types.
    pub fn sub_properties(self) -> &'static [(&'static str, InferredType)] {
        match self {
            FieldType::Duration => DURATION_PROPS,
            FieldType::Money => MONEY_PROPS,
            FieldType::Address => ADDRESS_PROPS,
            FieldType::Phone => PHONE_PROPS,
            FieldType::Coordinate => COORDINATE_PROPS,
            FieldType::Bbox => BBOX_PROPS,
            FieldType::Person => PERSON_PROPS,
            FieldType::Organization => ORGANIZATION_PROPS,
            FieldType::Identification => IDENTIFICATION_PROPS,
            _ => &[],
        }
    }

    pub fn sub_property(self, name: &str) -> Option<InferredType> {
        self.sub_properties()
            .iter()
            .find(|(p, _)| *p == name)
            .map(|(_, t)| *t)
    }
}

// ──────────────────────────────────────────────
// Built-in functions
// ──────────────────────────────────────────────

/// Signature of a built-in function. A parameter typed `Unknown` accepts
/// anything; when `variadic`, the last parameter repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub params: &'static [InferredType],
    pub variadic: bool,
    pub returns: InferredType,
}

impl FunctionSignature {
    pub fn accepts_arity(&self, n: usize) -> bool {
        if self.variadic {
            n + 1 >= self.params.len()
        } else {
            n == self.params.len()
        }
    }
}

const fn sig(
    name: &'static str,
    params: &'static [InferredType],
    variadic: bool,
    returns: InferredType,
) -> FunctionSignature {
    FunctionSignature {
        name,
        params,
        variadic,
        returns,
    }
}

use InferredType as T;

/// The standard built-in function table.
pub const BUILTIN_FUNCTIONS: &[FunctionSignature] = &[
    sig("all", &[T::Boolean], true, T::Boolean),
    sig("any", &[T::Boolean], true, T::Boolean),
    sig("xor", &[T::Boolean, T::Boolean], false, T::Boolean),
    sig("isEmpty", &[T::Unknown], false, T::Boolean),
    sig("isPresent", &[T::Unknown], false, T::Boolean),
    sig("contains", &[T::Unknown, T::Unknown], false, T::Boolean),
    sig("startsWith", &[T::Unknown, T::Unknown], false, T::Boolean),
    sig("endsWith", &[T::Unknown, T::Unknown], false, T::Boolean),
    sig("min", &[T::Number], true, T::Number),
    sig("max", &[T::Number], true, T::Number),
    sig("sum", &[T::Number], true, T::Number),
    sig("abs", &[T::Number], false, T::Number),
    sig("round", &[T::Number], false, T::Number),
    sig("floor", &[T::Number], false, T::Number),
    sig("ceil", &[T::Number], false, T::Number),
    sig("length", &[T::Unknown], false, T::Integer),
    sig("count", &[T::Unknown], false, T::Integer),
    sig("lower", &[T::String], false, T::String),
    sig("upper", &[T::String], false, T::String),
    sig("trim", &[T::String], false, T::String),
    sig("concat", &[T::String], true, T::String),
    sig("today", &[], false, T::Date),
    sig("now", &[], false, T::Datetime),
    sig("if", &[T::Boolean, T::Unknown, T::Unknown], false, T::Unknown),
];

// ──────────────────────────────────────────────
// Type environment
// ──────────────────────────────────────────────

/// Name -> type table for one validation pass: field paths, logic keys
/// (and their sub-properties), plus the built-in function table.
#[derive(Debug, Clone)]
pub struct TypeEnvironment {
    vars: IndexMap<String, TypeInference>,
    functions: &'static [FunctionSignature],
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        TypeEnvironment::new()
    }
}

impl TypeEnvironment {
    /// An empty environment seeded with [`BUILTIN_FUNCTIONS`].
    pub fn new() -> Self {
        TypeEnvironment::with_functions(BUILTIN_FUNCTIONS)
    }

    pub fn with_functions(functions: &'static [FunctionSignature]) -> Self {
        TypeEnvironment {
            vars: IndexMap::new(),
            functions,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, t: TypeInference) {
        self.vars.insert(name.into(), t);
    }

    pub fn get(&self, name: &str) -> Option<TypeInference> {
        self.vars.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// A name is known if it is a variable or a built-in function.
    pub fn is_known(&self, name: &str) -> bool {
        self.contains(name) || self.function(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
