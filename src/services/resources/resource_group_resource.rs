use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use super::methods::{DeleteOptions, ListOptions};
use super::model::ResourceGroup;
use crate::error::ProviderError;
use crate::resource::{
    expand_tags, flatten_location, flatten_tags, get_string, require_string, requires_import,
    Resource, Timeouts,
};
use crate::resourceids::{ResourceGroupId, ResourceId};
use crate::schema::{common, Attribute, Schema};
use crate::services::Clients;
use crate::validation;

pub const TYPE_NAME: &str = "azurerm_resource_group";

/// `azurerm_resource_group`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceGroupResource;

impl ResourceGroupResource {
    fn expand(state: &Value) -> ResourceGroup {
        ResourceGroup {
            location: get_string(state, "location").unwrap_or_default(),
            managed_by: get_string(state, "managed_by"),
            tags: expand_tags(state),
            ..Default::default()
        }
    }

    fn flatten(id: &ResourceGroupId, group: &ResourceGroup, prior: &Value) -> Value {
        json!({
            "id": id.id(),
            "name": id.resource_group_name,
            "location": flatten_location(get_string(prior, "location").as_deref(), &group.location),
            "managed_by": group.managed_by,
            "tags": flatten_tags(group.tags.as_ref()),
        })
    }

    async fn write(
        &self,
        clients: &Clients,
        id: &ResourceGroupId,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let group = clients
            .resource_groups
            .create_or_update(id, &Self::expand(planned))
            .await?;
        Ok(Self::flatten(id, &group, planned))
    }
}

#[async_trait]
impl Resource for ResourceGroupResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_validate(validation::resource_group_name)
                    .with_description("The Name which should be used for this Resource Group."),
            )
            .with_attribute("location", common::location())
            .with_attribute(
                "managed_by",
                Attribute::optional_string()
                    .with_validate(validation::non_empty_string)
                    .with_description("The ID of the resource or application that manages this Resource Group."),
            )
            .with_attribute("tags", common::tags())
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::with_write(Duration::from_secs(90 * 60))
    }

    fn validate_id(&self, id: &str) -> Result<(), ProviderError> {
        ResourceGroupId::parse(id)?;
        Ok(())
    }

    async fn create(&self, clients: &Clients, planned: Value) -> Result<Value, ProviderError> {
        let name = require_string(TYPE_NAME, &planned, "name")?;
        let id = ResourceGroupId::new(clients.subscription_id(), name);

        match clients.resource_groups.get(&id).await {
            Ok(_) => return Err(requires_import(TYPE_NAME, &id.id())),
            Err(err) if err.was_not_found() => {},
            Err(err) => return Err(err.into()),
        }

        let state = self.write(clients, &id, &planned).await?;
        info!(id = %id, "created resource group");
        Ok(state)
    }

    async fn read(&self, clients: &Clients, state: Value) -> Result<Option<Value>, ProviderError> {
        let id = ResourceGroupId::parse(&require_string(TYPE_NAME, &state, "id")?)?;
        match clients.resource_groups.get(&id).await {
            Ok(group) => Ok(Some(Self::flatten(&id, &group, &state))),
            Err(err) if err.was_not_found() => {
                info!(id = %id, "resource group was not found, removing from state");
                Ok(None)
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn update(
        &self,
        clients: &Clients,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = ResourceGroupId::parse(&require_string(TYPE_NAME, &prior, "id")?)?;
        let state = self.write(clients, &id, &planned).await?;
        info!(id = %id, "updated resource group");
        Ok(state)
    }

    async fn delete(&self, clients: &Clients, state: Value) -> Result<(), ProviderError> {
        let id = ResourceGroupId::parse(&require_string(TYPE_NAME, &state, "id")?)?;

        if clients.features().resource_group.prevent_deletion_if_contains_resources {
            let remaining = clients
                .resource_groups
                .list_resources_complete(&id, &ListOptions::default())
                .await?;
            if !remaining.is_empty() {
                let ids: Vec<&str> = remaining.iter().filter_map(|r| r.id.as_deref()).collect();
                warn!(id = %id, count = remaining.len(), "resource group still contains resources");
                return Err(ProviderError::FailedPrecondition(format!(
                    "deleting {}: the Resource Group still contains {} Resource(s):\n\n{}\n\nEither remove these resources first or set `prevent_deletion_if_contains_resources` to false in the `resource_group` block of the `features` block.",
                    id,
                    remaining.len(),
                    ids.join("\n")
                )));
            }
        }

        clients
            .resource_groups
            .delete_then_poll(&id, &DeleteOptions::default())
            .await?;
        info!(id = %id, "deleted resource group");
        Ok(())
    }
}
