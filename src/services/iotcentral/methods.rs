use std::sync::Arc;
use tracing::instrument;

use super::id::IoTAppId;
use super::model::{App, AppAvailabilityInfo, AppPatch, OperationInputs};
use crate::client::pager::field_matches;
use crate::client::{
    BaseClient, MatchAll, Page, Poller, Predicate, RequestOptions, ResourceManagerClient,
};
use crate::error::ClientError;
use crate::resourceids::{ResourceGroupId, ResourceId, SubscriptionId};

pub const API_VERSION: &str = "2021-06-01";

/// Filters listed applications. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppOperationPredicate {
    pub id: Option<String>,
    pub location: Option<String>,
    pub name: Option<String>,
    pub type_: Option<String>,
}

impl Predicate<App> for AppOperationPredicate {
    fn matches(&self, item: &App) -> bool {
        field_matches(&self.id, &item.id)
            && field_matches(&self.location, &Some(item.location.clone()))
            && field_matches(&self.name, &item.name)
            && field_matches(&self.type_, &item.type_)
    }
}

/// Operations on `Microsoft.IoTCentral/IoTApps`.
#[derive(Debug, Clone)]
pub struct AppsClient {
    client: ResourceManagerClient,
}

impl AppsClient {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self {
            client: ResourceManagerClient::new(base, "iotcentral.AppsClient", API_VERSION),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &IoTAppId) -> Result<App, ClientError> {
        let response = self.client.execute("Get", RequestOptions::get(id.id())).await?;
        self.client.decode("Get", &response)
    }

    #[instrument(skip(self, input))]
    pub async fn create_or_update(
        &self,
        id: &IoTAppId,
        input: &App,
    ) -> Result<Poller, ClientError> {
        let body = self.client.encode("CreateOrUpdate", input)?;
        self.client
            .execute_long_running(
                "CreateOrUpdate",
                RequestOptions::put(id.id()).with_body(body).expect(&[200, 201, 202]),
            )
            .await
    }

    pub async fn create_or_update_then_poll(
        &self,
        id: &IoTAppId,
        input: &App,
    ) -> Result<(), ClientError> {
        self.create_or_update(id, input).await?.poll_until_done().await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &IoTAppId, input: &AppPatch) -> Result<Poller, ClientError> {
        let body = self.client.encode("Update", input)?;
        self.client
            .execute_long_running(
                "Update",
                RequestOptions::patch(id.id()).with_body(body).expect(&[200, 202]),
            )
            .await
    }

    pub async fn update_then_poll(
        &self,
        id: &IoTAppId,
        input: &AppPatch,
    ) -> Result<(), ClientError> {
        self.update(id, input).await?.poll_until_done().await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &IoTAppId) -> Result<Poller, ClientError> {
        self.client
            .execute_long_running(
                "Delete",
                RequestOptions::delete(id.id()).expect(&[200, 202, 204]),
            )
            .await
    }

    pub async fn delete_then_poll(&self, id: &IoTAppId) -> Result<(), ClientError> {
        self.delete(id).await?.poll_until_done().await
    }

    fn list_by_resource_group_options(id: &ResourceGroupId) -> RequestOptions {
        RequestOptions::get(format!("{}/providers/Microsoft.IoTCentral/iotApps", id.id()))
    }

    /// The first page of applications in a resource group.
    pub async fn list_by_resource_group(
        &self,
        id: &ResourceGroupId,
    ) -> Result<Page<App>, ClientError> {
        self.client
            .list_page("ListByResourceGroup", Self::list_by_resource_group_options(id))
            .await
    }

    pub async fn list_by_resource_group_complete(
        &self,
        id: &ResourceGroupId,
    ) -> Result<Vec<App>, ClientError> {
        self.list_by_resource_group_complete_matching_predicate(id, &MatchAll).await
    }

    pub async fn list_by_resource_group_complete_matching_predicate<P: Predicate<App>>(
        &self,
        id: &ResourceGroupId,
        predicate: &P,
    ) -> Result<Vec<App>, ClientError> {
        self.client
            .list_complete(
                "ListByResourceGroup",
                Self::list_by_resource_group_options(id),
                predicate,
            )
            .await
    }

    fn list_by_subscription_options(id: &SubscriptionId) -> RequestOptions {
        RequestOptions::get(format!("{}/providers/Microsoft.IoTCentral/iotApps", id.id()))
    }

    /// The first page of applications in a subscription.
    pub async fn list_by_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Page<App>, ClientError> {
        self.client
            .list_page("ListBySubscription", Self::list_by_subscription_options(id))
            .await
    }

    pub async fn list_by_subscription_complete(
        &self,
        id: &SubscriptionId,
    ) -> Result<Vec<App>, ClientError> {
        self.list_by_subscription_complete_matching_predicate(id, &MatchAll).await
    }

    pub async fn list_by_subscription_complete_matching_predicate<P: Predicate<App>>(
        &self,
        id: &SubscriptionId,
        predicate: &P,
    ) -> Result<Vec<App>, ClientError> {
        self.client
            .list_complete("ListBySubscription", Self::list_by_subscription_options(id), predicate)
            .await
    }

    #[instrument(skip(self))]
    pub async fn check_name_availability(
        &self,
        id: &SubscriptionId,
        input: &OperationInputs,
    ) -> Result<AppAvailabilityInfo, ClientError> {
        let body = self.client.encode("CheckNameAvailability", input)?;
        let response = self
            .client
            .execute(
                "CheckNameAvailability",
                RequestOptions::post(format!(
                    "{}/providers/Microsoft.IoTCentral/checkNameAvailability",
                    id.id()
                ))
                .with_body(body),
            )
            .await?;
        self.client.decode("CheckNameAvailability", &response)
    }
}
