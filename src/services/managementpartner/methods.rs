use std::sync::Arc;
use tracing::instrument;

use super::id::PartnerId;
use super::model::PartnerResponse;
use crate::client::{BaseClient, RequestOptions, ResourceManagerClient};
use crate::error::ClientError;
use crate::resourceids::ResourceId;

pub const API_VERSION: &str = "2018-02-01";

/// Operations on `Microsoft.ManagementPartner/partners`.
#[derive(Debug, Clone)]
pub struct PartnerClient {
    client: ResourceManagerClient,
}

impl PartnerClient {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self {
            client: ResourceManagerClient::new(
                base,
                "managementpartner.PartnerClient",
                API_VERSION,
            ),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &PartnerId) -> Result<PartnerResponse, ClientError> {
        let response = self.client.execute("Get", RequestOptions::get(id.id())).await?;
        self.client.decode("Get", &response)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, id: &PartnerId) -> Result<PartnerResponse, ClientError> {
        let response = self.client.execute("Create", RequestOptions::put(id.id())).await?;
        self.client.decode("Create", &response)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: &PartnerId) -> Result<PartnerResponse, ClientError> {
        let response = self.client.execute("Update", RequestOptions::patch(id.id())).await?;
        self.client.decode("Update", &response)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &PartnerId) -> Result<(), ClientError> {
        self.client
            .execute("Delete", RequestOptions::delete(id.id()).expect(&[200, 204]))
            .await?;
        Ok(())
    }
}
