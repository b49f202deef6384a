//! Azure services: IDs, models, API clients, resources and state upgraders.
//!
//! Each service lives in its own module and follows the same layout: `id`
//! for resource IDs, `model` and `constants` for the wire types, `methods`
//! for the API client and, where the provider manages something, the
//! resources built on top of them.

pub mod appservice;
pub mod containers;
pub mod iotcentral;
pub mod managementpartner;
pub mod network;
pub mod resources;

use std::sync::Arc;

use crate::client::BaseClient;
use crate::config::Features;
use crate::resource::{DataSource, Resource};

/// The service clients available to resources once the provider is configured.
#[derive(Debug, Clone)]
pub struct Clients {
    subscription_id: String,
    features: Features,
    pub iot_central: iotcentral::AppsClient,
    pub management_partner: managementpartner::PartnerClient,
    pub resource_groups: resources::ResourceGroupsClient,
}

impl Clients {
    pub fn new(base: Arc<BaseClient>, features: Features) -> Self {
        Self {
            subscription_id: base.subscription_id().to_string(),
            features,
            iot_central: iotcentral::AppsClient::new(base.clone()),
            management_partner: managementpartner::PartnerClient::new(base.clone()),
            resource_groups: resources::ResourceGroupsClient::new(base),
        }
    }

    /// The subscription new resources are created in.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn features(&self) -> &Features {
        &self.features
    }
}

/// Every managed resource the provider serves.
pub fn resources() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(iotcentral::IoTCentralApplicationResource),
        Arc::new(resources::ResourceGroupResource),
    ]
}

/// Every data source the provider serves.
pub fn data_sources() -> Vec<Arc<dyn DataSource>> {
    vec![Arc::new(resources::ResourceGroupDataSource)]
}
