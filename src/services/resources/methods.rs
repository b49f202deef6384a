use std::sync::Arc;
use tracing::instrument;

use super::model::{GenericResource, ResourceGroup};
use crate::client::pager::field_matches;
use crate::client::{
    BaseClient, MatchAll, Page, Poller, Predicate, RequestOptions, ResourceManagerClient,
};
use crate::error::ClientError;
use crate::resourceids::{ResourceGroupId, ResourceId, SubscriptionId};

pub const API_VERSION: &str = "2022-09-01";

/// `$filter` and `$top` for list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub filter: Option<String>,
    pub top: Option<i64>,
}

impl ListOptions {
    fn apply(&self, options: RequestOptions) -> RequestOptions {
        options
            .with_optional_query("$filter", self.filter.as_ref())
            .with_optional_query("$top", self.top)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// e.g. `Microsoft.Compute/virtualMachines`
    pub force_deletion_types: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGroupOperationPredicate {
    pub id: Option<String>,
    pub location: Option<String>,
    pub managed_by: Option<String>,
    pub name: Option<String>,
    pub type_: Option<String>,
}

impl Predicate<ResourceGroup> for ResourceGroupOperationPredicate {
    fn matches(&self, item: &ResourceGroup) -> bool {
        field_matches(&self.id, &item.id)
            && field_matches(&self.location, &Some(item.location.clone()))
            && field_matches(&self.managed_by, &item.managed_by)
            && field_matches(&self.name, &item.name)
            && field_matches(&self.type_, &item.type_)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericResourceOperationPredicate {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub managed_by: Option<String>,
    pub name: Option<String>,
    pub type_: Option<String>,
}

impl Predicate<GenericResource> for GenericResourceOperationPredicate {
    fn matches(&self, item: &GenericResource) -> bool {
        field_matches(&self.id, &item.id)
            && field_matches(&self.kind, &item.kind)
            && field_matches(&self.location, &item.location)
            && field_matches(&self.managed_by, &item.managed_by)
            && field_matches(&self.name, &item.name)
            && field_matches(&self.type_, &item.type_)
    }
}

/// Operations on `Microsoft.Resources/resourceGroups`.
#[derive(Debug, Clone)]
pub struct ResourceGroupsClient {
    client: ResourceManagerClient,
}

impl ResourceGroupsClient {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self {
            client: ResourceManagerClient::new(base, "resources.ResourceGroupsClient", API_VERSION),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &ResourceGroupId) -> Result<ResourceGroup, ClientError> {
        let response = self.client.execute("Get", RequestOptions::get(id.id())).await?;
        self.client.decode("Get", &response)
    }

    #[instrument(skip(self, input))]
    pub async fn create_or_update(
        &self,
        id: &ResourceGroupId,
        input: &ResourceGroup,
    ) -> Result<ResourceGroup, ClientError> {
        let body = self.client.encode("CreateOrUpdate", input)?;
        let response = self
            .client
            .execute(
                "CreateOrUpdate",
                RequestOptions::put(id.id()).with_body(body).expect(&[200, 201]),
            )
            .await?;
        self.client.decode("CreateOrUpdate", &response)
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        id: &ResourceGroupId,
        options: &DeleteOptions,
    ) -> Result<Poller, ClientError> {
        self.client
            .execute_long_running(
                "Delete",
                RequestOptions::delete(id.id())
                    .with_optional_query(
                        "forceDeletionTypes",
                        options.force_deletion_types.as_ref(),
                    )
                    .expect(&[200, 202]),
            )
            .await
    }

    pub async fn delete_then_poll(
        &self,
        id: &ResourceGroupId,
        options: &DeleteOptions,
    ) -> Result<(), ClientError> {
        self.delete(id, options).await?.poll_until_done().await
    }

    fn list_options(id: &SubscriptionId, options: &ListOptions) -> RequestOptions {
        options.apply(RequestOptions::get(format!("{}/resourcegroups", id.id())))
    }

    /// The first page of resource groups in a subscription.
    pub async fn list(
        &self,
        id: &SubscriptionId,
        options: &ListOptions,
    ) -> Result<Page<ResourceGroup>, ClientError> {
        self.client.list_page("List", Self::list_options(id, options)).await
    }

    pub async fn list_complete(
        &self,
        id: &SubscriptionId,
        options: &ListOptions,
    ) -> Result<Vec<ResourceGroup>, ClientError> {
        self.list_complete_matching_predicate(id, options, &MatchAll).await
    }

    pub async fn list_complete_matching_predicate<P: Predicate<ResourceGroup>>(
        &self,
        id: &SubscriptionId,
        options: &ListOptions,
        predicate: &P,
    ) -> Result<Vec<ResourceGroup>, ClientError> {
        self.client
            .list_complete("List", Self::list_options(id, options), predicate)
            .await
    }

    fn list_resources_options(id: &ResourceGroupId, options: &ListOptions) -> RequestOptions {
        options.apply(RequestOptions::get(format!("{}/resources", id.id())))
    }

    /// The first page of resources inside a resource group.
    pub async fn list_resources(
        &self,
        id: &ResourceGroupId,
        options: &ListOptions,
    ) -> Result<Page<GenericResource>, ClientError> {
        self.client
            .list_page("ListResources", Self::list_resources_options(id, options))
            .await
    }

    pub async fn list_resources_complete(
        &self,
        id: &ResourceGroupId,
        options: &ListOptions,
    ) -> Result<Vec<GenericResource>, ClientError> {
        self.list_resources_complete_matching_predicate(id, options, &MatchAll).await
    }

    pub async fn list_resources_complete_matching_predicate<P: Predicate<GenericResource>>(
        &self,
        id: &ResourceGroupId,
        options: &ListOptions,
        predicate: &P,
    ) -> Result<Vec<GenericResource>, ClientError> {
        self.client
            .list_complete("ListResources", Self::list_resources_options(id, options), predicate)
            .await
    }
}
