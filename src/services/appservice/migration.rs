use tracing::debug;

use crate::error::ProviderError;
use crate::migration::{normalize_id, RawState, StateUpgrader};
use crate::resourceids::AppServicePlanId;
use crate::schema::{common, Attribute, Block, NestedBlock, Schema};

/// Attributes shared by Linux web app and function app slots.
fn slot_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string().with_force_new())
        .with_attribute("app_service_id", Attribute::required_string().with_force_new())
        // Empty when the slot shares the parent app's plan.
        .with_attribute("service_plan_id", Attribute::optional_string())
        .with_attribute("app_settings", Attribute::optional_string_map())
        .with_attribute("client_affinity_enabled", Attribute::optional_bool())
        .with_attribute("enabled", Attribute::optional_bool().with_default(serde_json::json!(true)))
        .with_attribute("https_only", Attribute::optional_bool())
        .with_attribute("default_hostname", Attribute::computed_string())
        .with_attribute("kind", Attribute::computed_string())
        .with_attribute("outbound_ip_addresses", Attribute::computed_string())
        .with_attribute("tags", common::tags())
        .with_block(
            "site_config",
            NestedBlock::list(
                Block::new()
                    .with_attribute("always_on", Attribute::optional_bool())
                    .with_attribute("ftps_state", Attribute::optional_string())
                    .with_attribute("http2_enabled", Attribute::optional_bool())
                    .with_attribute("minimum_tls_version", Attribute::optional_string()),
            )
            .with_min_items(1)
            .with_max_items(1),
        )
}

fn normalize_service_plan_id(raw: &mut RawState) -> Result<(), ProviderError> {
    debug!("migrating service_plan_id to the canonical casing");
    normalize_id::<AppServicePlanId>(raw, "service_plan_id")
}

/// Rewrites `service_plan_id` of `azurerm_linux_web_app_slot` with the
/// canonical casing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxWebAppSlotV0ToV1;

impl StateUpgrader for LinuxWebAppSlotV0ToV1 {
    fn schema(&self) -> Schema {
        slot_schema()
            .with_attribute("zip_deploy_file", Attribute::optional_computed_string())
            .with_attribute(
                "key_vault_reference_identity_id",
                Attribute::optional_computed_string(),
            )
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        normalize_service_plan_id(&mut raw)?;
        Ok(raw)
    }
}

/// Rewrites `service_plan_id` of `azurerm_linux_function_app_slot` with the
/// canonical casing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxFunctionAppSlotV0ToV1;

impl StateUpgrader for LinuxFunctionAppSlotV0ToV1 {
    fn schema(&self) -> Schema {
        slot_schema()
            .with_attribute("storage_account_name", Attribute::optional_string())
            .with_attribute("storage_account_access_key", Attribute::optional_string().sensitive())
            .with_attribute("functions_extension_version", Attribute::optional_string())
            .with_attribute("builtin_logging_enabled", Attribute::optional_bool())
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        normalize_service_plan_id(&mut raw)?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const LOWER: &str = "/subscriptions/sub/resourcegroups/rg/providers/Microsoft.Web/serverfarms/plan1";
    const CANONICAL: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Web/serverFarms/plan1";

    fn state(service_plan_id: Option<&str>) -> RawState {
        let mut raw = RawState::new();
        raw.insert("name".to_string(), json!("staging"));
        if let Some(id) = service_plan_id {
            raw.insert("service_plan_id".to_string(), json!(id));
        }
        raw
    }

    fn upgraders() -> Vec<Box<dyn StateUpgrader>> {
        vec![Box::new(LinuxWebAppSlotV0ToV1), Box::new(LinuxFunctionAppSlotV0ToV1)]
    }

    #[test]
    fn test_normalises_service_plan_id() {
        for upgrader in upgraders() {
            let upgraded = upgrader.upgrade(state(Some(LOWER))).unwrap();
            assert_eq!(upgraded["service_plan_id"], Value::String(CANONICAL.to_string()));
        }
    }

    #[test]
    fn test_empty_or_absent_left_untouched() {
        for upgrader in upgraders() {
            assert_eq!(upgrader.upgrade(state(Some(""))).unwrap(), state(Some("")));
            assert_eq!(upgrader.upgrade(state(None)).unwrap(), state(None));
        }
    }

    #[test]
    fn test_invalid_service_plan_id() {
        for upgrader in upgraders() {
            assert!(upgrader.upgrade(state(Some("/subscriptions/sub/resourceGroups/rg"))).is_err());
        }
    }

    #[test]
    fn test_prior_schemas() {
        assert!(LinuxWebAppSlotV0ToV1.schema().attribute("zip_deploy_file").is_some());
        assert!(LinuxFunctionAppSlotV0ToV1
            .schema()
            .attribute("storage_account_access_key")
            .is_some_and(|a| a.flags.sensitive));
    }
}
