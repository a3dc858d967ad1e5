//! Recursive wrapping of nested fields.
//!
//! For each field that the parent's spec maps to a child spec, a plain map
//! value becomes a child [`ValidatedMap`] and a non-empty list made only of
//! plain maps becomes a list of child maps. Null, scalars, mixed lists and
//! values that are already validated pass through untouched.
//!
//! Only one level of nested specs is consulted here. Each child is built
//! with the parent's options (recursion, throw policy, relaxation), so it
//! looks up its own nested specs and the process repeats until a spec has
//! none.
//!
//! Gap: a field with no nested spec, or whose spec yields no key set, stays
//! a plain map. Callers cannot assume every map below a validated map is
//! itself validated.

use crate::error::SchemaError;
use crate::options::Options;
use crate::spec::{NestedSpecs, SpecId, SpecSource};
use crate::validated_map::ValidatedMap;
use crate::value::{Map, Value};

pub(crate) fn wrap_nested<S>(
    mut data: Map,
    nested: &NestedSpecs,
    options: &Options,
    specs: &S,
) -> Result<Map, SchemaError>
where
    S: SpecSource + ?Sized,
{
    for (field, spec) in nested {
        if !data.contains_key(field.as_str()) {
            continue;
        }
        if specs.extract_keys(spec).is_none() {
            tracing::debug!(field = %field, spec = %spec, "nested spec has no key set; field left plain");
            continue;
        }
        if let Some(value) = data.remove(field.as_str()) {
            let wrapped = wrap_value(value, spec, options, specs)?;
            data.insert(field.clone(), wrapped);
        }
    }
    Ok(data)
}

fn wrap_value<S>(
    value: Value,
    spec: &SpecId,
    options: &Options,
    specs: &S,
) -> Result<Value, SchemaError>
where
    S: SpecSource + ?Sized,
{
    let child = options.for_nested(spec);
    match value {
        Value::Map(m) => ValidatedMap::build(m, &child, specs).map(Value::Record),
        Value::List(items)
            if !items.is_empty() && items.iter().all(|v| matches!(v, Value::Map(_))) =>
        {
            items
                .into_iter()
                .map(|item| match item {
                    Value::Map(m) => ValidatedMap::build(m, &child, specs).map(Value::Record),
                    other => Ok(other),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        other => Ok(other),
    }
}
