//! State upgrades between schema versions.
//!
//! A resource whose schema version is `N` registers one [`StateUpgrader`] per
//! older version. Persisted state written at version `v` runs through the steps
//! for `v`, `v + 1`, ... `N - 1` in order. Each step sees the raw attribute map
//! as written under the prior schema and returns the map for the next version.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::ProviderError;
use crate::resourceids::ResourceId;
use crate::schema::Schema;

/// Persisted attributes of a single resource instance.
pub type RawState = Map<String, Value>;

/// Moves persisted state from one schema version to the next.
pub trait StateUpgrader: Send + Sync {
    /// The schema the state was written under.
    fn schema(&self) -> Schema;

    /// Transform the raw state. An error aborts the upgrade of this instance.
    fn upgrade(&self, raw: RawState) -> Result<RawState, ProviderError>;
}

/// The upgrade steps of a resource, keyed by the version they upgrade from.
#[derive(Default)]
pub struct StateUpgraders {
    steps: BTreeMap<u64, Box<dyn StateUpgrader>>,
}

impl fmt::Debug for StateUpgraders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpgraders")
            .field("from_versions", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StateUpgraders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step upgrading state at `from_version` to `from_version + 1`.
    pub fn with_step(mut self, from_version: u64, upgrader: impl StateUpgrader + 'static) -> Self {
        self.steps.insert(from_version, Box::new(upgrader));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The schema state at `version` was written under, if a step exists for it.
    pub fn schema_for(&self, version: u64) -> Option<Schema> {
        self.steps.get(&version).map(|step| step.schema())
    }

    /// Upgrade `state` from `from_version` to `to_version`.
    pub fn upgrade(
        &self,
        resource_type: &str,
        from_version: u64,
        to_version: u64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        if from_version > to_version {
            return Err(ProviderError::StateUpgrade(format!(
                "{}: state version {} is newer than schema version {}",
                resource_type, from_version, to_version
            )));
        }
        if from_version == to_version {
            return Ok(state);
        }

        let mut raw = match state {
            Value::Object(raw) => raw,
            Value::Null => RawState::new(),
            other => {
                return Err(ProviderError::StateUpgrade(format!(
                    "{}: expected state to be an object, got {}",
                    resource_type, other
                )))
            },
        };

        for version in from_version..to_version {
            let step = self.steps.get(&version).ok_or_else(|| {
                ProviderError::StateUpgrade(format!(
                    "{}: no state upgrader from schema version {}",
                    resource_type, version
                ))
            })?;
            debug!(resource_type, from = version, to = version + 1, "upgrading state");
            raw = step.upgrade(raw).map_err(|e| {
                ProviderError::StateUpgrade(format!(
                    "{}: upgrading from schema version {}: {}",
                    resource_type, version, e
                ))
            })?;
        }

        Ok(Value::Object(raw))
    }
}

/// Rewrite the ID stored under `key` in its canonical form.
///
/// The stored value is parsed insensitively, since older versions persisted
/// IDs as returned by the API. A missing or empty value is left untouched.
pub fn normalize_id<T: ResourceId>(raw: &mut RawState, key: &str) -> Result<(), ProviderError> {
    let Some(old) = raw.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let id = T::parse_insensitively(old)?;
    raw.insert(key.to_string(), Value::String(id.id()));
    Ok(())
}

/// Like [`normalize_id`], but a missing or empty value is an error.
pub fn normalize_required_id<T: ResourceId>(
    raw: &mut RawState,
    key: &str,
) -> Result<(), ProviderError> {
    match raw.get(key).and_then(Value::as_str) {
        Some(old) if !old.is_empty() => normalize_id::<T>(raw, key),
        _ => Err(ProviderError::StateUpgrade(format!(
            "expected {:?} to be a non-empty string",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resourceids::ResourceGroupId;
    use crate::schema::Attribute;
    use serde_json::json;

    struct AddSuffix(&'static str);

    impl StateUpgrader for AddSuffix {
        fn schema(&self) -> Schema {
            Schema::v0().with_attribute("name", Attribute::required_string())
        }

        fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
            let name = raw.get("name").and_then(Value::as_str).unwrap_or_default();
            let renamed = format!("{}{}", name, self.0);
            raw.insert("name".to_string(), json!(renamed));
            Ok(raw)
        }
    }

    struct Fails;

    impl StateUpgrader for Fails {
        fn schema(&self) -> Schema {
            Schema::v0()
        }

        fn upgrade(&self, _raw: RawState) -> Result<RawState, ProviderError> {
            Err(ProviderError::Validation("bad state".to_string()))
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let upgraders = StateUpgraders::new()
            .with_step(1, AddSuffix("-b"))
            .with_step(0, AddSuffix("-a"));

        let upgraded = upgraders.upgrade("test", 0, 2, json!({"name": "x"})).unwrap();
        assert_eq!(upgraded, json!({"name": "x-a-b"}));

        let upgraded = upgraders.upgrade("test", 1, 2, json!({"name": "x"})).unwrap();
        assert_eq!(upgraded, json!({"name": "x-b"}));
        assert!(upgraders.schema_for(0).is_some());
        assert!(upgraders.schema_for(2).is_none());
    }

    #[test]
    fn test_current_version_is_unchanged() {
        let upgraders = StateUpgraders::new();
        let state = json!({"name": "x"});
        assert_eq!(upgraders.upgrade("test", 3, 3, state.clone()).unwrap(), state);
    }

    #[test]
    fn test_missing_step() {
        let upgraders = StateUpgraders::new().with_step(0, AddSuffix("-a"));
        let err = upgraders.upgrade("test", 0, 2, json!({})).unwrap_err();
        assert!(err.to_string().contains("no state upgrader from schema version 1"));
    }

    #[test]
    fn test_newer_state_is_rejected() {
        let err = StateUpgraders::new().upgrade("test", 3, 1, json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::StateUpgrade(_)));
    }

    #[test]
    fn test_failing_step_aborts() {
        let upgraders = StateUpgraders::new().with_step(0, Fails);
        let err = upgraders.upgrade("test", 0, 1, json!({"name": "x"})).unwrap_err();
        assert!(err.to_string().contains("bad state"));
    }

    #[test]
    fn test_normalize_id() {
        let mut raw = RawState::new();
        raw.insert("id".to_string(), json!("/subscriptions/sub/resourcegroups/rg1"));
        normalize_id::<ResourceGroupId>(&mut raw, "id").unwrap();
        assert_eq!(raw["id"], "/subscriptions/sub/resourceGroups/rg1");

        let mut empty = RawState::new();
        empty.insert("id".to_string(), json!(""));
        normalize_id::<ResourceGroupId>(&mut empty, "id").unwrap();
        assert_eq!(empty["id"], "");
        assert!(normalize_required_id::<ResourceGroupId>(&mut empty, "id").is_err());

        let mut invalid = RawState::new();
        invalid.insert("id".to_string(), json!("/subscriptions/sub"));
        assert!(matches!(
            normalize_id::<ResourceGroupId>(&mut invalid, "id"),
            Err(ProviderError::InvalidId(_))
        ));
    }
}
