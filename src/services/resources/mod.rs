//! Microsoft.Resources (API version 2022-09-01): resource groups and their
//! contents.

mod methods;
mod model;
mod resource_group_data_source;
mod resource_group_resource;

pub use methods::{
    DeleteOptions, GenericResourceOperationPredicate, ListOptions, ResourceGroupOperationPredicate,
    ResourceGroupsClient, API_VERSION,
};
pub use model::{GenericResource, ResourceGroup, ResourceGroupProperties};
pub use resource_group_data_source::{ResourceGroupDataSource, DATA_SOURCE_TYPE_NAME};
pub use resource_group_resource::{ResourceGroupResource, TYPE_NAME};
