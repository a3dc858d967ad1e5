//! Schema extraction adapters.
//!
//! Containers consume schemas, they do not define them. A [`SpecSource`]
//! maps a spec identifier to the flat set of permitted keys and to the
//! fields whose values are themselves described by a spec. Sources must
//! tolerate shapes they do not understand by answering `None` or an empty
//! map; construction then falls back to the next schema source.
//!
//! Two sources ship with the crate:
//! - [`SpecTable`]: explicit definitions, built in code or loaded from JSON.
//! - [`JsonSchemaSpecs`]: JSON Schema documents, keyed by `$id` or file name.

use core::fmt;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::SpecLoadError;
use crate::schema::Schema;
use crate::value::Key;

/// Identifier of an externally described spec, e.g. `"slack/reaction"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecId(String);

impl SpecId {
    pub fn new(id: impl Into<String>) -> Self {
        SpecId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecId {
    fn from(s: &str) -> Self {
        SpecId(s.to_owned())
    }
}

impl From<String> for SpecId {
    fn from(s: String) -> Self {
        SpecId(s)
    }
}

/// Field name to the spec describing that field's value.
pub type NestedSpecs = HashMap<Key, SpecId>;

/// Read-only view over an external spec registry.
pub trait SpecSource {
    /// Permitted keys for `spec`, or `None` when the spec is unknown or its
    /// shape carries no key set.
    fn extract_keys(&self, spec: &SpecId) -> Option<Schema>;

    /// Fields of `spec` whose values are described by another spec.
    fn extract_nested_specs(&self, spec: &SpecId) -> NestedSpecs;
}

impl<T: SpecSource + ?Sized> SpecSource for &T {
    fn extract_keys(&self, spec: &SpecId) -> Option<Schema> {
        (**self).extract_keys(spec)
    }

    fn extract_nested_specs(&self, spec: &SpecId) -> NestedSpecs {
        (**self).extract_nested_specs(spec)
    }
}

impl<T: SpecSource + ?Sized> SpecSource for std::sync::Arc<T> {
    fn extract_keys(&self, spec: &SpecId) -> Option<Schema> {
        (**self).extract_keys(spec)
    }

    fn extract_nested_specs(&self, spec: &SpecId) -> NestedSpecs {
        (**self).extract_nested_specs(spec)
    }
}

/// Source that knows no specs. Every schema then comes from explicit
/// options or from the raw input.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpecs;

impl SpecSource for NoSpecs {
    fn extract_keys(&self, _spec: &SpecId) -> Option<Schema> {
        None
    }

    fn extract_nested_specs(&self, _spec: &SpecId) -> NestedSpecs {
        NestedSpecs::new()
    }
}

/// One entry of a [`SpecTable`].
///
/// `keys` is `None` for an entry created only through
/// [`SpecTable::nest`]; an empty set is a real schema that admits no keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecDef {
    pub keys: Option<Schema>,
    pub nested: NestedSpecs,
}

/// Explicit spec definitions.
///
/// The JSON form is an object of spec id to definition:
///
/// ```json
/// { "slack/message": { "keys": ["text", "user"], "nested": { "user": "slack/user" } } }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecTable {
    specs: HashMap<SpecId, SpecDef>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) `id` with the given keys and no nested specs.
    pub fn define<I, K>(mut self, id: impl Into<SpecId>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.specs.insert(
            id.into(),
            SpecDef {
                keys: Some(Schema::new(keys)),
                nested: NestedSpecs::new(),
            },
        );
        self
    }

    /// Declare that `field` of `id` holds values described by `child`.
    pub fn nest(
        mut self,
        id: impl Into<SpecId>,
        field: impl Into<Key>,
        child: impl Into<SpecId>,
    ) -> Self {
        self.specs
            .entry(id.into())
            .or_default()
            .nested
            .insert(field.into(), child.into());
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, SpecLoadError> {
        serde_json::from_str(s).map_err(|source| SpecLoadError::Parse {
            name: "<spec table>".to_owned(),
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SpecLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SpecLoadError::Parse {
            name: path.display().to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl SpecSource for SpecTable {
    fn extract_keys(&self, spec: &SpecId) -> Option<Schema> {
        self.specs.get(spec)?.keys.clone()
    }

    fn extract_nested_specs(&self, spec: &SpecId) -> NestedSpecs {
        self.specs
            .get(spec)
            .map(|d| d.nested.clone())
            .unwrap_or_default()
    }
}

/// Specs backed by JSON Schema documents.
///
/// Keys are the names under `properties`, unioned across `allOf` branches.
/// A property whose schema is `{"$ref": id}`, or an array whose `items` is
/// `{"$ref": id}`, is a nested spec; the `$ref` string is used verbatim as
/// the child's [`SpecId`]. Documents without `properties` have no key set.
#[derive(Clone, Debug, Default)]
pub struct JsonSchemaSpecs {
    documents: HashMap<SpecId, Json>,
}

impl JsonSchemaSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<SpecId>, document: Json) {
        self.documents.insert(id.into(), document);
    }

    /// Load every `*.schema.json` file in `dir`. A document is registered
    /// under its `$id` when it has one, and always under its file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SpecLoadError> {
        let dir = dir.as_ref();
        let io_err = |source| SpecLoadError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut specs = Self::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".schema.json") {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|source| SpecLoadError::Io {
                path: path.clone(),
                source,
            })?;
            let document: Json =
                serde_json::from_str(&text).map_err(|source| SpecLoadError::Parse {
                    name: name.to_owned(),
                    source,
                })?;
            if let Some(id) = document.get("$id").and_then(Json::as_str) {
                specs.insert(id, document.clone());
            }
            specs.insert(name, document);
        }
        tracing::debug!(dir = %dir.display(), documents = specs.documents.len(), "loaded JSON schema specs");
        Ok(specs)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn branches(document: &Json) -> Vec<&serde_json::Map<String, Json>> {
        let mut out = Vec::new();
        if let Some(props) = document.get("properties").and_then(Json::as_object) {
            out.push(props);
        }
        if let Some(all) = document.get("allOf").and_then(Json::as_array) {
            for branch in all {
                out.extend(Self::branches(branch));
            }
        }
        out
    }
}

fn ref_of(property: &Json) -> Option<&str> {
    if let Some(r) = property.get("$ref").and_then(Json::as_str) {
        return Some(r);
    }
    property
        .get("items")
        .and_then(|items| items.get("$ref"))
        .and_then(Json::as_str)
}

impl SpecSource for JsonSchemaSpecs {
    fn extract_keys(&self, spec: &SpecId) -> Option<Schema> {
        let branches = Self::branches(self.documents.get(spec)?);
        if branches.is_empty() {
            return None;
        }
        Some(branches.into_iter().flat_map(|p| p.keys().cloned()).collect())
    }

    fn extract_nested_specs(&self, spec: &SpecId) -> NestedSpecs {
        let Some(document) = self.documents.get(spec) else {
            return NestedSpecs::new();
        };
        Self::branches(document)
            .into_iter()
            .flat_map(|p| p.iter())
            .filter_map(|(field, property)| {
                ref_of(property).map(|r| (field.clone(), SpecId::from(r)))
            })
            .collect()
    }
}
