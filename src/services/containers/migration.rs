use serde_json::{json, Value};
use tracing::debug;

use super::id::KubernetesClusterId;
use crate::error::ProviderError;
use crate::migration::{normalize_required_id, RawState, StateUpgrader};
use crate::schema::{common, Attribute, Block, NestedBlock, Schema};

/// The attributes of `azurerm_kubernetes_cluster` that state upgrades read.
fn prior_schema() -> Schema {
    let azure_active_directory = Block::new()
        .with_attribute("client_app_id", Attribute::required_string())
        .with_attribute("server_app_id", Attribute::required_string())
        .with_attribute("server_app_secret", Attribute::required_string().sensitive())
        .with_attribute("tenant_id", Attribute::optional_computed_string());

    let role_based_access_control = Block::new()
        .with_attribute("enabled", Attribute::required_bool())
        .with_block(
            "azure_active_directory",
            NestedBlock::list(azure_active_directory).with_max_items(1),
        );

    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string().with_force_new())
        .with_attribute("location", common::location())
        .with_attribute("resource_group_name", common::resource_group_name())
        .with_attribute("dns_prefix", Attribute::required_string().with_force_new())
        .with_attribute("kubernetes_version", Attribute::optional_computed_string())
        .with_attribute("fqdn", Attribute::computed_string())
        .with_attribute("node_resource_group", Attribute::optional_computed_string())
        .with_attribute("tags", common::tags())
        .with_block(
            "role_based_access_control",
            NestedBlock::list(role_based_access_control).with_max_items(1),
        )
}

/// Rewrites `id` with the canonical casing.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesClusterV0ToV1;

impl StateUpgrader for KubernetesClusterV0ToV1 {
    fn schema(&self) -> Schema {
        prior_schema()
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        debug!("migrating Kubernetes Cluster ID to the canonical casing");
        normalize_required_id::<KubernetesClusterId>(&mut raw, "id")?;
        Ok(raw)
    }
}

/// Copies `role_based_access_control.0.azure_active_directory.0.server_app_secret`
/// into the top-level `azure_active_directory_role_based_access_control` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesClusterV1ToV2;

impl KubernetesClusterV1ToV2 {
    fn first(value: Option<&Value>) -> Option<&Value> {
        value.and_then(Value::as_array).and_then(|list| list.first())
    }

    /// `None` when the cluster has an empty `azure_active_directory` list.
    fn server_app_secret(raw: &RawState) -> Option<Option<String>> {
        let Some(rbac) = Self::first(raw.get("role_based_access_control")) else {
            return Some(None);
        };
        let Some(aad) = rbac.get("azure_active_directory") else {
            return Some(None);
        };
        if aad.as_array().is_some_and(Vec::is_empty) {
            return None;
        }
        let secret = Self::first(Some(aad))
            .and_then(|aad| aad.get("server_app_secret"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(secret)
    }
}

impl StateUpgrader for KubernetesClusterV1ToV2 {
    fn schema(&self) -> Schema {
        Schema { version: 1, ..prior_schema() }
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        let Some(secret) = Self::server_app_secret(&raw) else {
            return Ok(raw);
        };

        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            debug!("copying server_app_secret into azure_active_directory_role_based_access_control");
            raw.insert(
                "azure_active_directory_role_based_access_control".to_string(),
                json!([{ "server_app_secret": secret }]),
            );
        }
        Ok(raw)
    }
}
