//! Microsoft.IoTCentral (API version 2021-06-01) and the
//! `azurerm_iotcentral_application` resource.

mod application_resource;
mod constants;
mod id;
mod methods;
mod migration;
mod model;
mod validate;

pub use application_resource::{IoTCentralApplicationResource, TYPE_NAME};
pub use constants::{
    AppSku, AppState, ProvisioningState, PublicNetworkAccess, SystemAssignedServiceIdentityType,
};
pub use id::IoTAppId;
pub use methods::{AppOperationPredicate, AppsClient, API_VERSION};
pub use migration::ApplicationV0ToV1;
pub use model::{
    App, AppAvailabilityInfo, AppPatch, AppProperties, AppSkuInfo, OperationInputs,
    SystemAssignedServiceIdentity,
};
pub use validate::{application_name, display_name};
