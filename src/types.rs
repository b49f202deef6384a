//! Plan, import and metadata types exchanged with the provider host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A change to a single top-level attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub path: String,
    /// The value before the change, `None` when the attribute is being set.
    pub before: Option<Value>,
    /// The value after the change, `None` when the attribute is being removed.
    pub after: Option<Value>,
}

impl AttributeChange {
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// Compute the top-level attribute changes between two states.
///
/// Null and absent attributes are treated alike. The result is sorted by path.
pub fn diff(prior: &Value, proposed: &Value) -> Vec<AttributeChange> {
    let empty = serde_json::Map::new();
    let prior = prior.as_object().unwrap_or(&empty);
    let proposed = proposed.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = prior.keys().chain(proposed.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let before = prior.get(key).filter(|v| !v.is_null());
            let after = proposed.get(key).filter(|v| !v.is_null());
            match (before, after) {
                (None, None) => None,
                (Some(b), Some(a)) if b == a => None,
                (b, a) => Some(AttributeChange::new(key.clone(), b.cloned(), a.cloned())),
            }
        })
        .collect()
}

/// The result of planning a resource change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub planned_state: Value,
    pub changes: Vec<AttributeChange>,
    /// Whether the change can only be applied by destroying and recreating.
    pub requires_replace: bool,
    /// The ForceNew attributes whose change triggered the replacement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_paths: Vec<String>,
}

impl PlanResult {
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
            replace_paths: Vec::new(),
        }
    }

    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        replace_paths: Vec<String>,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace: !replace_paths.is_empty(),
            replace_paths,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// A resource brought under management by `terraform import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    pub resource_type: String,
    pub state: Value,
}

impl ImportedResource {
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// The resources and data sources a provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("app1"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("app1")));

        let removed = AttributeChange::removed("tags", json!({"env": "prod"}));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("sku", json!("ST1"), json!("ST2"));
        assert_eq!(modified.before, Some(json!("ST1")));
        assert_eq!(modified.after, Some(json!("ST2")));
    }

    #[test]
    fn test_diff() {
        let prior = json!({"name": "app1", "sku": "ST1", "display_name": null, "tags": {"a": "b"}});
        let proposed = json!({"name": "app1", "sku": "ST2", "template": "iotc-pnp-preview@1.0.0"});

        let changes = diff(&prior, &proposed);
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["sku", "tags", "template"]);
        assert_eq!(changes[1].after, None);
        assert_eq!(changes[2].before, None);
    }

    #[test]
    fn test_diff_against_null() {
        let changes = diff(&Value::Null, &json!({"name": "rg1"}));
        assert_eq!(changes, vec![AttributeChange::added("name", json!("rg1"))]);
        assert!(diff(&json!({"a": 1}), &json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "123"}));
        assert!(!no_change.has_changes());
        assert!(!no_change.requires_replace);

        let replace = PlanResult::with_changes(
            json!({"location": "westus"}),
            vec![AttributeChange::modified("location", json!("westeurope"), json!("westus"))],
            vec!["location".to_string()],
        );
        assert!(replace.requires_replace);
        assert!(replace.has_changes());

        let in_place = PlanResult::with_changes(json!({}), vec![], vec![]);
        assert!(!in_place.requires_replace);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new(
            "azurerm_resource_group",
            json!({"id": "/subscriptions/0000/resourceGroups/rg1"}),
        );
        assert_eq!(imported.resource_type, "azurerm_resource_group");
        assert_eq!(imported.state["id"], "/subscriptions/0000/resourceGroups/rg1");
    }
}
