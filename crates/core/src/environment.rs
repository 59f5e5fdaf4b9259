//! Type environment construction: field paths first, then logic keys in
//! dependency order.

use crate::artifact::{FieldMap, LogicEntry, LogicSection, LogicValue};
use crate::dependency::{topological_sort_logic_keys, TopologicalOrder};
use crate::field_paths::{collect_field_types, DEFAULT_MAX_DEPTH, FIELDS_PREFIX};
use crate::infer::infer_expression_type;
use crate::parser::parse_expression;
use crate::types::{InferredType, TypeEnvironment, TypeInference};
use tracing::debug;

pub fn build_type_environment(fields: &FieldMap, logic: &LogicSection) -> TypeEnvironment {
    build_type_environment_with_depth(fields, logic, DEFAULT_MAX_DEPTH)
}

pub fn build_type_environment_with_depth(
    fields: &FieldMap,
    logic: &LogicSection,
    max_depth: usize,
) -> TypeEnvironment {
    build_environment(fields, logic, max_depth).0
}

/// Build the environment and return the logic-key order it was built in.
pub fn build_environment(
    fields: &FieldMap,
    logic: &LogicSection,
    max_depth: usize,
) -> (TypeEnvironment, TopologicalOrder) {
    let mut env = TypeEnvironment::new();
    for (path, ty) in collect_field_types(fields, FIELDS_PREFIX, max_depth) {
        env.insert(path, seed(ty));
    }
    let field_count = env.len();

    let order = topological_sort_logic_keys(logic);
    for key in &order.sorted {
        let Some(entry) = logic.get(key) else {
            continue;
        };
        if order.is_cyclic(key) {
            env.insert(key.clone(), TypeInference::UNKNOWN);
            for (sub, _) in entry.declared_type.sub_properties() {
                env.insert(format!("{}.{}", key, sub), TypeInference::UNKNOWN);
            }
            continue;
        }
        record_key(&mut env, key, entry);
    }

    debug!(
        fields = field_count,
        logic_keys = logic.len(),
        cyclic = order.cyclic_keys.len(),
        "type environment built"
    );
    (env, order)
}

fn seed(ty: InferredType) -> TypeInference {
    if ty == InferredType::Unknown {
        TypeInference::UNKNOWN
    } else {
        TypeInference::certain(ty)
    }
}

fn record_key(env: &mut TypeEnvironment, key: &str, entry: &LogicEntry) {
    let declared = entry.declared_type;
    let composite = !declared.sub_properties().is_empty();
    let own = match &entry.value {
        LogicValue::Bool(_) => TypeInference::inferred(InferredType::Boolean),
        LogicValue::Expr(text) => infer_text(text, env),
        // An object literal has the shape of its declared composite type.
        LogicValue::Object(_) if composite => TypeInference::inferred(declared.value_type()),
        LogicValue::Object(_) => TypeInference::UNKNOWN,
    };

    // Sub-properties are resolved against the environment as it stood
    // before this key was added.
    let shape_confirmed = own.is_confident() && own.ty == declared.value_type();
    let mut subs = Vec::new();
    for (sub, ty) in declared.sub_properties() {
        let t = match &entry.value {
            LogicValue::Object(props) => props
                .get(*sub)
                .map_or(TypeInference::UNKNOWN, |text| infer_text(text, env)),
            _ if shape_confirmed => TypeInference::inferred(*ty),
            _ => TypeInference::UNKNOWN,
        };
        subs.push((format!("{}.{}", key, sub), t));
    }

    env.insert(key, own);
    for (path, t) in subs {
        env.insert(path, t);
    }
}

/// Inferred type of `text`, recorded with `Inferred` confidence. Abstention
/// and parse failures stay `Unknown`; the validator reports those.
fn infer_text(text: &str, env: &TypeEnvironment) -> TypeInference {
    let Ok(parsed) = parse_expression(text) else {
        return TypeInference::UNKNOWN;
    };
    let t = infer_expression_type(&parsed.ast, env);
    if t.is_confident() {
        TypeInference::inferred(t.ty)
    } else {
        TypeInference::UNKNOWN
    }
}

/// Declared value type of a logic entry, used when reporting mismatches.
pub fn declared_value_type(entry: &LogicEntry, sub: Option<&str>) -> InferredType {
    match sub {
        Some(s) => entry
            .declared_type
            .sub_property(s)
            .unwrap_or(InferredType::Unknown),
        None => entry.declared_type.value_type(),
    }
}
