use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::constants::{AppSku, PublicNetworkAccess};
use super::id::IoTAppId;
use super::migration::ApplicationV0ToV1;
use super::model::{App, AppPatch, AppProperties, AppSkuInfo, OperationInputs};
use super::validate;
use crate::error::ProviderError;
use crate::migration::StateUpgraders;
use crate::resource::{
    expand_tags, flatten_location, flatten_tags, get_bool, get_string, require_string,
    requires_import, Resource,
};
use crate::resourceids::{ResourceId, SubscriptionId};
use crate::schema::{common, Attribute, Schema};
use crate::services::Clients;
use crate::validation;

pub const TYPE_NAME: &str = "azurerm_iotcentral_application";

const DEFAULT_TEMPLATE: &str = "iotc-pnp-preview@1.0.0";

/// `azurerm_iotcentral_application`
#[derive(Debug, Clone, Copy, Default)]
pub struct IoTCentralApplicationResource;

impl IoTCentralApplicationResource {
    /// The attributes shared by every schema version.
    pub(super) fn attributes(schema: Schema) -> Schema {
        schema
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_validate(validate::application_name),
            )
            .with_attribute("resource_group_name", common::resource_group_name())
            .with_attribute("location", common::location())
            .with_attribute(
                "sub_domain",
                Attribute::required_string().with_validate(validate::application_name),
            )
            .with_attribute(
                "display_name",
                Attribute::optional_computed_string().with_validate(validate::display_name),
            )
            .with_attribute(
                "sku",
                Attribute::optional_string()
                    .with_default(json!(AppSku::St1.as_str()))
                    .with_validate(validation::string_in::<AppSku>),
            )
            .with_attribute(
                "template",
                Attribute::optional_computed_string()
                    .with_force_new()
                    .with_default(json!(DEFAULT_TEMPLATE)),
            )
            .with_attribute(
                "public_network_access_enabled",
                Attribute::optional_bool().with_default(json!(true)),
            )
            .with_attribute("tags", common::tags())
    }

    fn expand(state: &Value) -> App {
        App {
            id: None,
            identity: None,
            location: get_string(state, "location").unwrap_or_default(),
            name: None,
            properties: Some(Self::expand_properties(state)),
            sku: AppSkuInfo {
                name: Self::expand_sku(state),
            },
            tags: expand_tags(state),
            type_: None,
        }
    }

    fn expand_sku(state: &Value) -> AppSku {
        get_string(state, "sku")
            .map(|s| AppSku::parse(&s))
            .unwrap_or(AppSku::St1)
    }

    fn expand_properties(state: &Value) -> AppProperties {
        AppProperties {
            display_name: get_string(state, "display_name"),
            subdomain: get_string(state, "sub_domain"),
            template: get_string(state, "template"),
            public_network_access: Some(PublicNetworkAccess::from_enabled(
                get_bool(state, "public_network_access_enabled").unwrap_or(true),
            )),
            ..Default::default()
        }
    }

    fn flatten(id: &IoTAppId, app: &App, prior: &Value) -> Value {
        let properties = app.properties.clone().unwrap_or_default();
        let public_network_access_enabled =
            properties.public_network_access != Some(PublicNetworkAccess::Disabled);
        if !app.sku.name.is_known() {
            warn!(sku = %app.sku.name, "unknown IoT Central SKU returned by the API");
        }
        json!({
            "id": id.id(),
            "name": id.iot_app_name,
            "resource_group_name": id.resource_group_name,
            "location": flatten_location(get_string(prior, "location").as_deref(), &app.location),
            "sub_domain": properties.subdomain,
            "display_name": properties.display_name,
            "sku": app.sku.name.as_str(),
            "template": properties.template,
            "public_network_access_enabled": public_network_access_enabled,
            "tags": flatten_tags(app.tags.as_ref()),
        })
    }

    async fn read_after_write(
        &self,
        clients: &Clients,
        id: &IoTAppId,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let mut state = planned.clone();
        if let Value::Object(map) = &mut state {
            map.insert("id".to_string(), json!(id.id()));
        }
        self.read(clients, state)
            .await?
            .ok_or_else(|| {
                ProviderError::NotFound(format!("{} was not found after it was written", id))
            })
    }
}

#[async_trait]
impl Resource for IoTCentralApplicationResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::attributes(Schema::new(1))
    }

    fn state_upgraders(&self) -> StateUpgraders {
        StateUpgraders::new().with_step(0, ApplicationV0ToV1)
    }

    fn validate_id(&self, id: &str) -> Result<(), ProviderError> {
        IoTAppId::parse(id)?;
        Ok(())
    }

    async fn create(&self, clients: &Clients, planned: Value) -> Result<Value, ProviderError> {
        let id = IoTAppId::new(
            clients.subscription_id(),
            require_string(TYPE_NAME, &planned, "resource_group_name")?,
            require_string(TYPE_NAME, &planned, "name")?,
        );

        match clients.iot_central.get(&id).await {
            Ok(_) => return Err(requires_import(TYPE_NAME, &id.id())),
            Err(err) if err.was_not_found() => {},
            Err(err) => return Err(err.into()),
        }

        let availability = clients
            .iot_central
            .check_name_availability(
                &SubscriptionId::new(clients.subscription_id()),
                &OperationInputs::new(id.iot_app_name.clone()),
            )
            .await?;
        if availability.name_available == Some(false) {
            return Err(ProviderError::FailedPrecondition(format!(
                "the IoT Central application name {:?} is unavailable: {}",
                id.iot_app_name,
                availability.message.unwrap_or_default()
            )));
        }

        clients
            .iot_central
            .create_or_update_then_poll(&id, &Self::expand(&planned))
            .await?;
        info!(id = %id, "created IoT Central application");

        self.read_after_write(clients, &id, &planned).await
    }

    async fn read(&self, clients: &Clients, state: Value) -> Result<Option<Value>, ProviderError> {
        let id = IoTAppId::parse(&require_string(TYPE_NAME, &state, "id")?)?;
        match clients.iot_central.get(&id).await {
            Ok(app) => Ok(Some(Self::flatten(&id, &app, &state))),
            Err(err) if err.was_not_found() => {
                info!(id = %id, "IoT Central application was not found, removing from state");
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
        let id = IoTAppId::parse(&require_string(TYPE_NAME, &prior, "id")?)?;
        let patch = AppPatch {
            identity: None,
            properties: Some(Self::expand_properties(&planned)),
            sku: Some(AppSkuInfo {
                name: Self::expand_sku(&planned),
            }),
            tags: Some(expand_tags(&planned).unwrap_or_default()),
        };
        clients.iot_central.update_then_poll(&id, &patch).await?;
        info!(id = %id, "updated IoT Central application");

        self.read_after_write(clients, &id, &planned).await
    }

    async fn delete(&self, clients: &Clients, state: Value) -> Result<(), ProviderError> {
        let id = IoTAppId::parse(&require_string(TYPE_NAME, &state, "id")?)?;
        clients.iot_central.delete_then_poll(&id).await?;
        info!(id = %id, "deleted IoT Central application");
        Ok(())
    }
}
