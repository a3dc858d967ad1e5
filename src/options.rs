//! Construction options and the per-container throw policy.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::spec::SpecId;

/// Throw policy frozen into every container.
///
/// Both flags default to `true`. Lenient reads are often useful; lenient
/// writes rarely are, because a write that silently does not happen is
/// harder to notice than a read that returns a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub throw_on_invalid_read: bool,
    pub throw_on_invalid_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            throw_on_invalid_read: true,
            throw_on_invalid_write: true,
        }
    }
}

impl Config {
    /// Lenient reads, strict writes.
    pub fn lenient_reads() -> Self {
        Self {
            throw_on_invalid_read: false,
            ..Self::default()
        }
    }

    /// Sentinels instead of errors for both reads and writes.
    pub fn lenient() -> Self {
        Self {
            throw_on_invalid_read: false,
            throw_on_invalid_write: false,
        }
    }
}

/// Options for [`ValidatedMap::build`](crate::ValidatedMap::build).
///
/// Schema resolution takes the first available of: `schema`, keys of
/// `spec_id`, keys of `metadata_spec`, keys of the raw input.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub schema: Option<Schema>,
    pub spec_id: Option<SpecId>,
    /// Spec the caller keeps associated with the raw input itself, e.g. the
    /// spec of the message it was decoded from. Not inherited by nested
    /// containers.
    pub metadata_spec: Option<SpecId>,
    pub recursive: bool,
    pub relax_constructor_constraints: bool,
    pub config: Config,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: impl Into<Schema>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn spec(mut self, spec: impl Into<SpecId>) -> Self {
        self.spec_id = Some(spec.into());
        self
    }

    pub fn metadata_spec(mut self, spec: impl Into<SpecId>) -> Self {
        self.metadata_spec = Some(spec.into());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn relax_constructor_constraints(mut self, relax: bool) -> Self {
        self.relax_constructor_constraints = relax;
        self
    }

    pub fn throw_on_invalid_read(mut self, throw: bool) -> Self {
        self.config.throw_on_invalid_read = throw;
        self
    }

    pub fn throw_on_invalid_write(mut self, throw: bool) -> Self {
        self.config.throw_on_invalid_write = throw;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Spec used to find nested specs when an explicit schema won
    /// resolution.
    pub(crate) fn nesting_spec(&self) -> Option<&SpecId> {
        self.spec_id.as_ref().or(self.metadata_spec.as_ref())
    }

    /// Options for a nested field described by `spec`: same policies, no
    /// explicit schema, no metadata.
    pub(crate) fn for_nested(&self, spec: &SpecId) -> Options {
        Options {
            schema: None,
            spec_id: Some(spec.clone()),
            metadata_spec: None,
            recursive: self.recursive,
            relax_constructor_constraints: self.relax_constructor_constraints,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_strict() {
        let c = Config::default();
        assert!(c.throw_on_invalid_read && c.throw_on_invalid_write);
        let parsed: Config = serde_json::from_str(r#"{"throw_on_invalid_read": false}"#).unwrap();
        assert_eq!(parsed, Config::lenient_reads());
    }

    #[test]
    fn nested_options_keep_policy_and_drop_schema() {
        let parent = Options::new()
            .schema(["a"])
            .spec("parent")
            .metadata_spec("meta")
            .recursive(true)
            .relax_constructor_constraints(true)
            .throw_on_invalid_read(false);
        let child = parent.for_nested(&SpecId::from("child"));

        assert!(child.schema.is_none());
        assert!(child.metadata_spec.is_none());
        assert_eq!(child.spec_id, Some(SpecId::from("child")));
        assert!(child.recursive && child.relax_constructor_constraints);
        assert_eq!(child.config, parent.config);
    }

    #[test]
    fn nesting_spec_prefers_explicit_spec() {
        let o = Options::new().metadata_spec("meta");
        assert_eq!(o.nesting_spec(), Some(&SpecId::from("meta")));
        let o = o.spec("own");
        assert_eq!(o.nesting_spec(), Some(&SpecId::from("own")));
    }
}
