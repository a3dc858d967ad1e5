//! ValidatedMap: immutable map that only admits keys from its schema.

use core::fmt;
use core::ops::Index;
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};

use crate::error::SchemaError;
use crate::nested;
use crate::options::{Config, Options};
use crate::schema::Schema;
use crate::spec::{SpecId, SpecSource};
use crate::value::{Key, Map, Value};

static NULL: Value = Value::Null;

/// Outcome of a schema-checked operation under a lenient policy.
///
/// `InvalidKey` is the sentinel returned instead of an error when the
/// container's [`Config`] does not throw. It is distinct from
/// `Valid(None)` (a schema key with no stored value) and from a stored
/// [`Value::Null`].
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum Checked<T> {
    Valid(T),
    InvalidKey,
}

impl<T> Checked<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Checked::Valid(_))
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Checked::InvalidKey)
    }

    /// The value, or `None` for the sentinel.
    pub fn valid(self) -> Option<T> {
        match self {
            Checked::Valid(v) => Some(v),
            Checked::InvalidKey => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        match self {
            Checked::Valid(v) => Checked::Valid(f(v)),
            Checked::InvalidKey => Checked::InvalidKey,
        }
    }
}

enum SchemaSource {
    Explicit,
    Spec(SpecId),
    Raw,
}

/// Immutable map whose keys are restricted to a schema.
///
/// Every key in the data is a member of the schema. Operations that would
/// change the map return a new `ValidatedMap`; the receiver is never
/// modified. The schema is shared between a map and the maps derived from
/// it.
///
/// Reads and writes of keys outside the schema fail with
/// [`SchemaError::InvalidKeyAccess`] / [`SchemaError::InvalidKeyAssoc`], or
/// return [`Checked::InvalidKey`] when the [`Config`] is lenient.
/// `dissoc` and `merge` never fail.
#[derive(Clone)]
pub struct ValidatedMap {
    data: Arc<Map>,
    schema: Schema,
    config: Config,
}

impl ValidatedMap {
    /// Wrap `raw` with its own key set as schema and the default strict
    /// policy.
    pub fn new(raw: Map) -> Self {
        let schema = raw.keys().cloned().collect();
        Self {
            data: Arc::new(raw),
            schema,
            config: Config::default(),
        }
    }

    /// Construct from `raw` according to `options`.
    ///
    /// The schema is the first available of: the explicit schema, the keys
    /// `specs` reports for `options.spec_id`, for `options.metadata_spec`,
    /// and finally the keys of `raw`. Input keys outside the schema fail
    /// with [`SchemaError::ConstructorSchemaViolation`] unless
    /// `relax_constructor_constraints` is set, in which case they are
    /// dropped. With `recursive`, nested fields are then wrapped using the
    /// nested specs of the spec that supplied the schema; see
    /// [`nested`](crate::nested).
    pub fn build<S>(raw: Map, options: &Options, specs: &S) -> Result<Self, SchemaError>
    where
        S: SpecSource + ?Sized,
    {
        let (schema, source) = resolve_schema(&raw, options, specs);
        let mut data = raw;

        let extra = schema.extra(data.keys());
        if !extra.is_empty() {
            if options.relax_constructor_constraints {
                tracing::debug!(dropped = ?extra, "dropping input keys outside schema");
                data.retain(|k, _| schema.contains(k));
            } else {
                return Err(SchemaError::ConstructorSchemaViolation {
                    extra_keys: extra,
                    schema: schema.sorted(),
                    spec_id: match source {
                        SchemaSource::Spec(spec) => Some(spec),
                        SchemaSource::Explicit | SchemaSource::Raw => None,
                    },
                });
            }
        }

        if options.recursive {
            // Nested specs come from the spec that resolved the schema. An
            // explicit schema has none of its own, so the options name it.
            let nesting = match &source {
                SchemaSource::Spec(spec) => Some(spec),
                SchemaSource::Explicit => options.nesting_spec(),
                SchemaSource::Raw => None,
            };
            if let Some(spec) = nesting {
                let nested_specs = specs.extract_nested_specs(spec);
                if !nested_specs.is_empty() {
                    data = nested::wrap_nested(data, &nested_specs, options, specs)?;
                }
            }
        }

        Ok(Self {
            data: Arc::new(data),
            schema,
            config: options.config,
        })
    }

    fn derive(&self, data: Map) -> Self {
        Self {
            data: Arc::new(data),
            schema: self.schema.clone(),
            config: self.config,
        }
    }

    fn access_error(&self, key: &str) -> SchemaError {
        SchemaError::InvalidKeyAccess {
            key: key.to_owned(),
            schema: self.schema.sorted(),
        }
    }

    /// Read `key`.
    ///
    /// `Valid(Some(v))` for a stored value, `Valid(None)` for a schema key
    /// with nothing stored.
    pub fn get(&self, key: &str) -> Result<Checked<Option<&Value>>, SchemaError> {
        if self.schema.contains(key) {
            return Ok(Checked::Valid(self.data.get(key)));
        }
        if self.config.throw_on_invalid_read {
            return Err(self.access_error(key));
        }
        tracing::trace!(key, "lenient read of key outside schema");
        Ok(Checked::InvalidKey)
    }

    /// Read `key`, falling back to `default` when nothing is stored or the
    /// key is outside the schema. Never fails, whatever the policy.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        if !self.schema.contains(key) {
            return default;
        }
        self.data.get(key).unwrap_or(default)
    }

    /// Read along `path` through nested maps.
    ///
    /// Each validated map on the way applies its own schema and policy; a
    /// plain map is read without checks. Reaching a missing value or a
    /// non-map value before the end of the path yields `Valid(None)`, as
    /// does an empty path.
    pub fn get_in(&self, path: &[&str]) -> Result<Checked<Option<&Value>>, SchemaError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(Checked::Valid(None));
        };
        let mut current = match self.get(first)? {
            Checked::Valid(v) => v,
            Checked::InvalidKey => return Ok(Checked::InvalidKey),
        };
        for key in rest {
            current = match current {
                Some(Value::Record(r)) => match r.get(key)? {
                    Checked::Valid(v) => v,
                    Checked::InvalidKey => return Ok(Checked::InvalidKey),
                },
                Some(Value::Map(m)) => m.get(*key),
                _ => return Ok(Checked::Valid(None)),
            };
        }
        Ok(Checked::Valid(current))
    }

    /// Return a new map with `key` set to `value`.
    pub fn assoc(
        &self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<Checked<ValidatedMap>, SchemaError> {
        let key = key.into();
        if !self.schema.contains(&key) {
            if self.config.throw_on_invalid_write {
                return Err(SchemaError::InvalidKeyAssoc {
                    key,
                    schema: self.schema.sorted(),
                });
            }
            tracing::trace!(key = %key, "lenient write of key outside schema");
            return Ok(Checked::InvalidKey);
        }
        let mut data = Map::clone(&self.data);
        data.insert(key, value.into());
        Ok(Checked::Valid(self.derive(data)))
    }

    /// Return a map without `key`. Removing a key that is absent, or not in
    /// the schema at all, returns an equal map.
    pub fn dissoc(&self, key: &str) -> ValidatedMap {
        if !self.data.contains_key(key) {
            return self.clone();
        }
        let mut data = Map::clone(&self.data);
        data.remove(key);
        self.derive(data)
    }

    /// Merge `entries` into a new map, skipping keys outside the schema.
    pub fn merge<I, K, V>(&self, entries: I) -> ValidatedMap
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let mut data = Map::clone(&self.data);
        let mut skipped = 0usize;
        for (k, v) in entries {
            let k = k.into();
            if self.schema.contains(&k) {
                data.insert(k, v.into());
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::trace!(skipped, "merge skipped keys outside schema");
        }
        self.derive(data)
    }

    /// Merge a map, a validated map, or a `[key, value]` pair.
    ///
    /// Like [`merge`](Self::merge), out-of-schema keys are skipped. Any
    /// other shape fails with [`SchemaError::InvalidMergeInput`].
    pub fn conj(&self, value: Value) -> Result<ValidatedMap, SchemaError> {
        match value {
            Value::Map(m) => Ok(self.merge(m)),
            Value::Record(r) => Ok(self.merge(r.into_data())),
            Value::List(items) => match <[Value; 2]>::try_from(items) {
                Ok([Value::String(k), v]) => Ok(self.merge([(k, v)])),
                Ok(pair) => Err(SchemaError::InvalidMergeInput {
                    value: Value::List(Vec::from(pair)),
                }),
                Err(items) => Err(SchemaError::InvalidMergeInput {
                    value: Value::List(items),
                }),
            },
            other => Err(SchemaError::InvalidMergeInput { value: other }),
        }
    }

    /// Same data under a different schema. Fails if the data holds keys the
    /// new schema does not allow.
    pub fn with_schema(&self, schema: impl Into<Schema>) -> Result<ValidatedMap, SchemaError> {
        let schema = schema.into();
        let extra = schema.extra(self.data.keys());
        if !extra.is_empty() {
            return Err(SchemaError::ConstructorSchemaViolation {
                extra_keys: extra,
                schema: schema.sorted(),
                spec_id: None,
            });
        }
        Ok(Self {
            data: Arc::clone(&self.data),
            schema,
            config: self.config,
        })
    }

    /// Same data and schema under a different policy.
    pub fn with_config(&self, config: Config) -> ValidatedMap {
        Self {
            data: Arc::clone(&self.data),
            schema: self.schema.clone(),
            config,
        }
    }

    /// Schema membership, not data presence.
    pub fn contains_key(&self, key: &str) -> bool {
        self.schema.contains(key)
    }

    /// Whether a value is stored under `key`.
    pub fn has_value(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> hashbrown::hash_map::Iter<'_, Key, Value> {
        self.data.iter()
    }

    pub fn keys(&self) -> hashbrown::hash_map::Keys<'_, Key, Value> {
        self.data.keys()
    }

    pub fn values(&self) -> hashbrown::hash_map::Values<'_, Key, Value> {
        self.data.values()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Borrow the data as a plain map.
    pub fn as_map(&self) -> &Map {
        &self.data
    }

    pub(crate) fn into_data(self) -> Map {
        Arc::try_unwrap(self.data).unwrap_or_else(|shared| Map::clone(&shared))
    }
}

fn resolve_schema<S>(raw: &Map, options: &Options, specs: &S) -> (Schema, SchemaSource)
where
    S: SpecSource + ?Sized,
{
    if let Some(schema) = &options.schema {
        return (schema.clone(), SchemaSource::Explicit);
    }
    for spec in [&options.spec_id, &options.metadata_spec].into_iter().flatten() {
        if let Some(schema) = specs.extract_keys(spec) {
            tracing::debug!(spec = %spec, keys = schema.len(), "schema resolved from spec");
            return (schema, SchemaSource::Spec(spec.clone()));
        }
        tracing::debug!(spec = %spec, "spec has no key set");
    }
    (raw.keys().cloned().collect(), SchemaSource::Raw)
}

/// Equal when both data and schema are equal; the policy is ignored.
impl PartialEq for ValidatedMap {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.data, &other.data) || self.data == other.data)
            && (self.schema.ptr_eq(&other.schema) || self.schema == other.schema)
    }
}

/// A validated map equals a plain map holding the same data.
///
/// Only this direction exists: to compare from the plain side, unwrap
/// first with [`Plain::into_plain`](crate::Plain::into_plain) or
/// [`as_map`](ValidatedMap::as_map).
impl PartialEq<Map> for ValidatedMap {
    fn eq(&self, other: &Map) -> bool {
        *self.data == *other
    }
}

impl fmt::Debug for ValidatedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedMap")
            .field("data", &self.data)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Panics on a key outside the schema, whatever the policy. A schema key
/// with nothing stored yields `Value::Null`.
impl Index<&str> for ValidatedMap {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        if !self.schema.contains(key) {
            panic!("{}", self.access_error(key));
        }
        self.data.get(key).unwrap_or(&NULL)
    }
}

/// Serialises as the underlying data; schema and policy are not written.
impl Serialize for ValidatedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Map::serialize(&self.data, serializer)
    }
}

impl<'a> IntoIterator for &'a ValidatedMap {
    type Item = (&'a Key, &'a Value);
    type IntoIter = hashbrown::hash_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
