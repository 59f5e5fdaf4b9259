//! Field-path collection: the runtime variable paths a field tree exposes.
//!
//! Every value-bearing field `id` under `prefix` exposes
//! `<prefix>.<id>.value`; composite types add `<prefix>.<id>.value.<sub>`
//! for each sub-property. Fieldsets expose no value of their own and
//! recurse with prefix `<prefix>.<id>`.

use crate::artifact::{FieldMap, FieldType};
use crate::types::InferredType;
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

/// Root prefix of all field paths.
pub const FIELDS_PREFIX: &str = "fields";

/// Default limit on fieldset nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// All runtime paths exposed by `fields`, in declaration order.
pub fn collect_field_paths(fields: &FieldMap, prefix: &str) -> IndexSet<String> {
    collect_field_types(fields, prefix, DEFAULT_MAX_DEPTH)
        .into_keys()
        .collect()
}

/// Bare dotted field ids (`applicant`, `applicant.name`), fieldsets included.
pub fn collect_field_ids(fields: &FieldMap) -> IndexSet<String> {
    let mut out = IndexSet::new();
    walk_ids(fields, "", 0, DEFAULT_MAX_DEPTH, &mut out);
    out
}

/// Runtime paths mapped to their value types. Fieldsets nested deeper than
/// `max_depth` are not descended into.
pub fn collect_field_types(
    fields: &FieldMap,
    prefix: &str,
    max_depth: usize,
) -> IndexMap<String, InferredType> {
    let mut out = IndexMap::new();
    walk_types(fields, prefix, 0, max_depth, &mut out);
    out
}

fn walk_types(
    fields: &FieldMap,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    out: &mut IndexMap<String, InferredType>,
) {
    for (id, field) in fields {
        let field_path = format!("{}.{}", prefix, id);
        if field.field_type == FieldType::Fieldset {
            if depth + 1 > max_depth {
                warn!(fieldset = %field_path, max_depth, "fieldset nesting limit reached; children skipped");
                continue;
            }
            walk_types(&field.fields, &field_path, depth + 1, max_depth, out);
            continue;
        }
        let value_path = format!("{}.value", field_path);
        out.insert(value_path.clone(), field.field_type.value_type());
        for (sub, ty) in field.field_type.sub_properties() {
            out.insert(format!("{}.{}", value_path, sub), *ty);
        }
    }
}

fn walk_ids(
    fields: &FieldMap,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    out: &mut IndexSet<String>,
) {
    for (id, field) in fields {
        let full = if prefix.is_empty() {
            id.clone()
        } else {
            format!("{}.{}", prefix, id)
        };
        out.insert(full.clone());
        if field.field_type == FieldType::Fieldset && depth < max_depth {
            walk_ids(&field.fields, &full, depth + 1, max_depth, out);
        }
    }
}
