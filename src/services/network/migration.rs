use tracing::debug;

use super::id::ApplicationGatewayId;
use crate::error::ProviderError;
use crate::migration::{normalize_id, RawState, StateUpgrader};
use crate::schema::{common, Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

/// Rewrites `id` with the canonical casing. An empty ID is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationGatewayV0ToV1;

impl StateUpgrader for ApplicationGatewayV0ToV1 {
    fn schema(&self) -> Schema {
        let named = || {
            Block::new()
                .with_attribute("id", Attribute::computed_string())
                .with_attribute("name", Attribute::required_string())
        };

        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("location", common::location())
            .with_attribute("resource_group_name", common::resource_group_name())
            .with_attribute("enable_http2", Attribute::optional_bool())
            .with_attribute("firewall_policy_id", Attribute::optional_string())
            .with_attribute(
                "zones",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::optional(),
                ),
            )
            .with_attribute("tags", common::tags())
            .with_block(
                "sku",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("name", Attribute::required_string())
                        .with_attribute("tier", Attribute::required_string())
                        .with_attribute("capacity", Attribute::optional_int64()),
                )
                .with_min_items(1)
                .with_max_items(1),
            )
            .with_block(
                "gateway_ip_configuration",
                NestedBlock::list(named().with_attribute("subnet_id", Attribute::required_string()))
                    .with_min_items(1),
            )
            .with_block(
                "frontend_port",
                NestedBlock::list(named().with_attribute("port", Attribute::required_int64()))
                    .with_min_items(1),
            )
            .with_block(
                "backend_address_pool",
                NestedBlock::list(named()).with_min_items(1),
            )
            .with_block(
                "http_listener",
                NestedBlock::list(
                    named()
                        .with_attribute(
                            "frontend_ip_configuration_name",
                            Attribute::required_string(),
                        )
                        .with_attribute("frontend_port_name", Attribute::required_string())
                        .with_attribute("protocol", Attribute::required_string()),
                )
                .with_min_items(1),
            )
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        debug!("migrating Application Gateway ID to the canonical casing");
        normalize_id::<ApplicationGatewayId>(&mut raw, "id")?;
        Ok(raw)
    }
}
