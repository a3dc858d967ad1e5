//! validated-map: an immutable map that refuses to read or write keys
//! outside a declared schema, failing loudly at the first typo instead of
//! handing back a missing value that propagates silently.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: turn "misspelled key yields nothing" bugs into immediate,
//!   self-describing errors at the point of access.
//! - Layers:
//!   - SpecSource: read-only adapter over an external spec registry. It
//!     answers the key set of a spec and which fields hold values described
//!     by another spec.
//!   - ValidatedMap: `{data, schema, config}`. Construction resolves the
//!     schema once; every read and write checks membership against it.
//!   - nested: optional construction-time wrapping of nested maps (and
//!     lists of maps) into child ValidatedMaps, driven by nested specs.
//!   - SchemaRegistry: shared catalogue of identifier to schema, exported
//!     to a JSON snapshot and diffed against it to detect drift.
//!
//! Constraints
//! - Immutable: every operation that changes the map returns a new one.
//!   Unchanged storage (the schema always, the data for `with_*`) is
//!   shared through `Arc`.
//! - `data ⊆ schema` holds after construction and after any sequence of
//!   `assoc`/`dissoc`/`merge`/`conj`.
//! - `ValidatedMap` is `Send + Sync`; concurrent readers never race. The
//!   registry is the only shared mutable state and sits behind a lock.
//! - Membership only: value types are not validated.
//!
//! Schema resolution (first available wins)
//! - `Options::schema`, keys of `Options::spec_id`, keys of
//!   `Options::metadata_spec`, keys of the raw input.
//! - Input keys outside the resolved schema fail construction, unless
//!   `relax_constructor_constraints` drops them first. Relaxed filtering
//!   runs before nested wrapping, so a dropped nested map is never wrapped.
//!
//! Read/write contract
//! - `get`: strict policy fails with `InvalidKeyAccess`; lenient policy
//!   returns the `Checked::InvalidKey` sentinel. A schema key with nothing
//!   stored is `Checked::Valid(None)`, never the sentinel.
//! - `get_or`: never fails; out-of-schema keys yield the default.
//! - `assoc`: strict fails with `InvalidKeyAssoc`, lenient yields the
//!   sentinel. Writes default to strict because a silent non-write is worse
//!   than a silent non-read.
//! - `dissoc`: never fails; removing an absent or unknown key is a no-op.
//! - `merge`/`conj`: best effort, out-of-schema keys are skipped.
//!
//! Equality
//! - Two ValidatedMaps are equal when data and schema are equal.
//! - `ValidatedMap == Map` compares data only. The reverse comparison is
//!   deliberately absent; unwrap with [`Plain::into_plain`] first.
//!
//! Notes and non-goals
//! - Not a schema language: schemas come from a `SpecSource`.
//! - Nested maps without a spec stay plain maps.
//! - `Index` panics on an out-of-schema key regardless of policy; use `get`
//!   for a fallible read.

pub mod error;
pub mod nested;
pub mod options;
pub mod registry;
pub mod schema;
pub mod spec;
mod validated_map;
mod validated_map_proptest;
pub mod value;

// Public surface
pub use error::{SchemaError, SnapshotError, SpecLoadError};
pub use options::{Config, Options};
pub use registry::{KeyDiff, SchemaDiff, SchemaRegistry, Snapshot, DEFAULT_SNAPSHOT_PATH};
pub use schema::Schema;
pub use spec::{JsonSchemaSpecs, NestedSpecs, NoSpecs, SpecId, SpecSource, SpecTable};
pub use validated_map::{Checked, ValidatedMap};
pub use value::{map_from_json, Key, Map, Plain, Value};
