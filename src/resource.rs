//! Resources and data sources served by the provider.
//!
//! A [`Resource`] owns its schema, its timeouts, its state upgraders and the
//! four CRUD operations. The provider looks resources up by type name and runs
//! every operation with the configured [`Clients`] under the matching timeout.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ProviderError;
use crate::migration::StateUpgraders;
use crate::schema::Schema;
use crate::services::Clients;

/// How long each operation on a resource may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

impl Timeouts {
    /// The same limit for create, update and delete; reads keep their default.
    pub fn with_write(limit: Duration) -> Self {
        Self {
            create: limit,
            update: limit,
            delete: limit,
            ..Self::default()
        }
    }

    pub fn with_read(mut self, limit: Duration) -> Self {
        self.read = limit;
        self
    }
}

/// A managed resource type such as `azurerm_resource_group`.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The Terraform type name.
    fn type_name(&self) -> &'static str;

    /// The current schema, including its version.
    fn schema(&self) -> Schema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Upgrade steps for state written by older schema versions.
    fn state_upgraders(&self) -> StateUpgraders {
        StateUpgraders::new()
    }

    /// Check that `id` is an ID of this resource type. User supplied, so
    /// parsed case-sensitively.
    fn validate_id(&self, id: &str) -> Result<(), ProviderError>;

    /// Create the resource and return its state.
    async fn create(&self, clients: &Clients, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh the state. `None` means the resource no longer exists.
    async fn read(&self, clients: &Clients, state: Value) -> Result<Option<Value>, ProviderError>;

    async fn update(
        &self,
        clients: &Clients,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, clients: &Clients, state: Value) -> Result<(), ProviderError>;
}

/// A read-only data source such as `data.azurerm_resource_group`.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn read_timeout(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn read(&self, clients: &Clients, config: Value) -> Result<Value, ProviderError>;
}

/// The error for creating something that already exists outside of state.
pub fn requires_import(resource_type: &str, id: &str) -> ProviderError {
    ProviderError::AlreadyExists(format!(
        "a resource with the ID {:?} already exists - to be managed via Terraform this resource needs to be imported into the State. Please see the resource documentation for {:?} for more information.",
        id, resource_type
    ))
}

/// A non-empty string attribute.
pub fn get_string(state: &Value, key: &str) -> Option<String> {
    state
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A string attribute that must be set.
pub fn require_string(
    resource_type: &str,
    state: &Value,
    key: &str,
) -> Result<String, ProviderError> {
    get_string(state, key).ok_or_else(|| {
        ProviderError::Validation(format!("{}: {:?} must be set", resource_type, key))
    })
}

pub fn get_bool(state: &Value, key: &str) -> Option<bool> {
    state.get(key).and_then(Value::as_bool)
}

/// The `tags` attribute as a map. Non-string values are skipped.
pub fn expand_tags(state: &Value) -> Option<HashMap<String, String>> {
    let tags = state.get("tags")?.as_object()?;
    Some(
        tags.iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect(),
    )
}

/// Tags as stored in state. Absent tags are an empty map.
pub fn flatten_tags(tags: Option<&HashMap<String, String>>) -> Value {
    let map: Map<String, Value> = tags
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

/// The canonical form of an Azure region: lowercase without spaces.
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_ascii_lowercase()
}

/// Whether two location values name the same region.
pub fn locations_equal(old: &Value, new: &Value) -> bool {
    match (old.as_str(), new.as_str()) {
        (Some(old), Some(new)) => normalize_location(old) == normalize_location(new),
        _ => false,
    }
}

/// The location to store: the configured spelling when it names the same
/// region as the API, otherwise the API's.
pub fn flatten_location(configured: Option<&str>, remote: &str) -> String {
    match configured {
        Some(configured) if normalize_location(configured) == normalize_location(remote) => {
            configured.to_string()
        },
        _ => normalize_location(remote),
    }
}
