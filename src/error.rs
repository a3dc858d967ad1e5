//! Error types for container construction, lookups, and schema snapshots.
//!
//! Every container error carries the offending key(s) and the full schema,
//! sorted, so a message is enough to diagnose the failure on its own.

use std::path::PathBuf;

use thiserror::Error;

use crate::spec::SpecId;
use crate::value::{Key, Value};

/// Failure of a container operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Read of a key outside the schema in strict mode.
    #[error("invalid key {key:?} read; valid keys are {schema:?}")]
    InvalidKeyAccess {
        /// The key that was read.
        key: Key,
        /// Sorted schema of the container.
        schema: Vec<Key>,
    },

    /// Write of a key outside the schema in strict mode.
    #[error("invalid key {key:?} written; valid keys are {schema:?}")]
    InvalidKeyAssoc {
        /// The key that was written.
        key: Key,
        /// Sorted schema of the container.
        schema: Vec<Key>,
    },

    /// The raw input handed to the constructor has keys the schema does not allow.
    #[error(
        "input keys {extra_keys:?} are not in the schema {schema:?}{}",
        spec_suffix(.spec_id)
    )]
    ConstructorSchemaViolation {
        /// Sorted keys present in the input but missing from the schema.
        extra_keys: Vec<Key>,
        /// Sorted resolved schema.
        schema: Vec<Key>,
        /// Spec the schema was extracted from; `None` for an explicit schema.
        spec_id: Option<SpecId>,
    },

    /// `conj` was given something other than a map or a key/value pair.
    #[error("cannot merge {value:?} into a validated map; expected a map or a [key, value] pair")]
    InvalidMergeInput {
        /// The rejected value.
        value: Value,
    },
}

fn spec_suffix(spec_id: &Option<SpecId>) -> String {
    spec_id
        .as_ref()
        .map(|s| format!(" of spec {s}"))
        .unwrap_or_default()
}

/// Failure reading or writing a persisted schema snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("cannot read schema snapshot '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file could not be written.
    #[error("cannot write schema snapshot '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file is not a JSON object of identifier to key list.
    #[error("malformed schema snapshot '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory registry could not be serialised.
    #[error("cannot encode schema snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure loading spec definitions for a [`SpecSource`](crate::spec::SpecSource).
#[derive(Error, Debug)]
pub enum SpecLoadError {
    /// A spec file or directory could not be read.
    #[error("cannot read spec source '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spec document is not valid JSON of the expected shape.
    #[error("malformed spec document '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_message_lists_sorted_schema() {
        let e = SchemaError::InvalidKeyAccess {
            key: "desription".into(),
            schema: vec!["description".into(), "priority".into(), "title".into()],
        };
        assert_eq!(
            e.to_string(),
            r#"invalid key "desription" read; valid keys are ["description", "priority", "title"]"#
        );
    }

    #[test]
    fn violation_message_names_spec_when_present() {
        let e = SchemaError::ConstructorSchemaViolation {
            extra_keys: vec!["name".into()],
            schema: vec!["emoji_name".into()],
            spec_id: Some(SpecId::from("slack/reaction")),
        };
        assert!(e.to_string().ends_with("of spec slack/reaction"));

        let e = SchemaError::ConstructorSchemaViolation {
            extra_keys: vec!["name".into()],
            schema: vec!["emoji_name".into()],
            spec_id: None,
        };
        assert!(!e.to_string().contains("spec"));
    }
}
