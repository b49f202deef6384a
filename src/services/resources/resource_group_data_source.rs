use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::resource::{flatten_tags, normalize_location, require_string, DataSource};
use crate::resourceids::{ResourceGroupId, ResourceId};
use crate::schema::{common, Attribute, Schema};
use crate::services::Clients;
use crate::validation;

pub const DATA_SOURCE_TYPE_NAME: &str = "azurerm_resource_group";

/// `data.azurerm_resource_group`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceGroupDataSource;

#[async_trait]
impl DataSource for ResourceGroupDataSource {
    fn type_name(&self) -> &'static str {
        DATA_SOURCE_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_validate(validation::resource_group_name),
            )
            .with_attribute("location", common::location_computed())
            .with_attribute("managed_by", Attribute::computed_string())
            .with_attribute("tags", common::tags_computed())
    }

    async fn read(&self, clients: &Clients, config: Value) -> Result<Value, ProviderError> {
        let id = ResourceGroupId::new(
            clients.subscription_id(),
            require_string(DATA_SOURCE_TYPE_NAME, &config, "name")?,
        );

        let group = clients.resource_groups.get(&id).await.map_err(|err| {
            if err.was_not_found() {
                ProviderError::NotFound(format!("{} was not found", id))
            } else {
                err.into()
            }
        })?;

        Ok(json!({
            "id": id.id(),
            "name": id.resource_group_name,
            "location": normalize_location(&group.location),
            "managed_by": group.managed_by,
            "tags": flatten_tags(group.tags.as_ref()),
        }))
    }
}
