//! Microsoft.ManagementPartner (API version 2018-02-01).

mod constants;
mod id;
mod methods;
mod model;

pub use constants::ManagementPartnerState;
pub use id::PartnerId;
pub use methods::{PartnerClient, API_VERSION};
pub use model::{PartnerProperties, PartnerResponse};
