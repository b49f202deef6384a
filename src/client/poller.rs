//! Long-running operation polling.
//!
//! A [`Poller`] is built from the initial response of an operation and picks
//! how to track it:
//!
//! - an `Azure-AsyncOperation` header points at a status document whose
//!   `status` is polled until terminal (a document without one is an error);
//! - otherwise a `Location` header on a 201/202 is polled until it stops
//!   returning 202;
//! - otherwise a PUT/PATCH whose body reports a non-terminal
//!   `properties.provisioningState` polls the resource itself;
//! - otherwise the operation already finished.

use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{RequestOptions, ResourceManagerClient, Response};
use crate::error::ClientError;

/// The state of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl PollingStatus {
    /// Map an ARM status or provisioning state. Anything that is not
    /// terminal (`Accepted`, `Creating`, `Updating`, ...) is in progress.
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Intervals between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingOptions {
    /// Used when the service sends no `Retry-After`.
    pub default_interval: Duration,
    /// Upper bound on any single wait.
    pub max_interval: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
        }
    }
}

impl PollingOptions {
    /// Poll without waiting.
    pub fn immediate() -> Self {
        Self {
            default_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
        }
    }

    pub(crate) fn interval(&self, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or(self.default_interval)
            .min(self.max_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Strategy {
    AsyncOperation(String),
    Location(String),
    ProvisioningState(String),
    Done,
}

/// Tracks a long-running operation until it reaches a terminal state.
#[derive(Debug)]
pub struct Poller {
    client: ResourceManagerClient,
    operation: String,
    strategy: Strategy,
    status: PollingStatus,
    failure: Option<String>,
    retry_after: Option<Duration>,
}

impl Poller {
    /// Build a poller from the initial response of `operation`.
    ///
    /// `resource_url` is the absolute URL of the resource, used when only the
    /// provisioning state can be tracked.
    pub fn from_response(
        client: &ResourceManagerClient,
        operation: &str,
        method: &Method,
        resource_url: &str,
        response: &Response,
    ) -> Self {
        let mut status = PollingStatus::InProgress;
        let mut failure = None;

        let strategy = if let Some(url) = response.header("azure-asyncoperation") {
            Strategy::AsyncOperation(url.to_string())
        } else if let (Some(url), 201 | 202) = (response.header("location"), response.status) {
            Strategy::Location(url.to_string())
        } else if matches!(*method, Method::PUT | Method::PATCH)
            && matches!(response.status, 200 | 201)
        {
            match provisioning_state(response) {
                Some(PollingStatus::InProgress) => {
                    Strategy::ProvisioningState(resource_url.to_string())
                },
                Some(terminal @ (PollingStatus::Failed | PollingStatus::Canceled)) => {
                    status = terminal;
                    failure = Some(format!("provisioning state is {:?}", terminal));
                    Strategy::Done
                },
                _ => {
                    status = PollingStatus::Succeeded;
                    Strategy::Done
                },
            }
        } else {
            status = PollingStatus::Succeeded;
            Strategy::Done
        };

        Self {
            client: client.clone(),
            operation: operation.to_string(),
            strategy,
            status,
            failure,
            retry_after: response.retry_after(),
        }
    }

    pub fn status(&self) -> PollingStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// Poll once and return the new status.
    pub async fn poll(&mut self) -> Result<PollingStatus, ClientError> {
        if self.is_done() {
            return Ok(self.status);
        }

        let operation = format!("{}Poll", self.operation);
        let strategy = self.strategy.clone();
        let (status, retry_after) = match &strategy {
            Strategy::AsyncOperation(url) => {
                let response = self
                    .client
                    .get_url(&operation, url, &[200, 201, 202])
                    .await
                    .map_err(|e| self.polling_error(e.to_string()))?;
                let status = serde_json::from_str::<Value>(&response.body)
                    .ok()
                    .and_then(|body| {
                        body.get("status")
                            .and_then(Value::as_str)
                            .map(PollingStatus::from_status)
                    })
                    .ok_or_else(|| {
                        self.polling_error(format!(
                            "the operation status document has no status: {:?}",
                            response.body
                        ))
                    })?;
                if matches!(status, PollingStatus::Failed | PollingStatus::Canceled) {
                    self.failure = Some(
                        response
                            .arm_error()
                            .map(|(code, message)| format!("{}: {}", code, message))
                            .unwrap_or_else(|| format!("operation status is {:?}", status)),
                    );
                }
                (status, response.retry_after())
            },
            Strategy::Location(url) => {
                let response = self
                    .client
                    .get_url(&operation, url, &[200, 201, 202, 204])
                    .await
                    .map_err(|e| self.polling_error(e.to_string()))?;
                let status = if response.status == 202 {
                    PollingStatus::InProgress
                } else {
                    PollingStatus::Succeeded
                };
                (status, response.retry_after())
            },
            Strategy::ProvisioningState(url) => {
                let response = self
                    .client
                    .get_url(&operation, url, &[200])
                    .await
                    .map_err(|e| self.polling_error(e.to_string()))?;
                let status = provisioning_state(&response).unwrap_or(PollingStatus::Succeeded);
                if matches!(status, PollingStatus::Failed | PollingStatus::Canceled) {
                    self.failure = Some(format!("provisioning state is {:?}", status));
                }
                (status, response.retry_after())
            },
            Strategy::Done => (PollingStatus::Succeeded, None),
        };

        debug!(
            client = self.client.name(),
            operation = %self.operation,
            status = ?status,
            "polled long-running operation"
        );
        self.status = status;
        self.retry_after = retry_after;
        Ok(status)
    }

    /// Poll until the operation reaches a terminal state. Failed and
    /// canceled operations are errors.
    pub async fn poll_until_done(&mut self) -> Result<(), ClientError> {
        let options = self.client.base().polling_options().clone();
        while !self.is_done() {
            tokio::time::sleep(options.interval(self.retry_after)).await;
            self.poll().await?;
        }

        match self.status {
            PollingStatus::Succeeded => Ok(()),
            _ => Err(self.polling_error(
                self.failure
                    .clone()
                    .unwrap_or_else(|| format!("operation status is {:?}", self.status)),
            )),
        }
    }

    fn polling_error(&self, message: String) -> ClientError {
        ClientError::Polling {
            operation: format!("{}#{}", self.client.name(), self.operation),
            message,
        }
    }
}

fn provisioning_state(response: &Response) -> Option<PollingStatus> {
    let body: Value = serde_json::from_str(&response.body).ok()?;
    body.pointer("/properties/provisioningState")
        .and_then(Value::as_str)
        .map(PollingStatus::from_status)
}

impl ResourceManagerClient {
    /// Start a long-running operation and return a poller tracking it.
    pub async fn execute_long_running(
        &self,
        operation: &str,
        options: RequestOptions,
    ) -> Result<Poller, ClientError> {
        let method = options.method.clone();
        let resource_url = self.url(&options.path, &[]);
        let response = self.execute(operation, options).await?;
        Ok(Poller::from_response(
            self,
            operation,
            &method,
            &resource_url,
            &response,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_base_client, MockSender};
    use serde_json::json;
    use std::sync::Arc;

    fn client(sender: Arc<MockSender>) -> ResourceManagerClient {
        ResourceManagerClient::new(
            Arc::new(test_base_client(sender)),
            "iotcentral.AppsClient",
            "2021-06-01",
        )
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(PollingStatus::from_status("Succeeded"), PollingStatus::Succeeded);
        assert_eq!(PollingStatus::from_status("FAILED"), PollingStatus::Failed);
        assert_eq!(PollingStatus::from_status("Cancelled"), PollingStatus::Canceled);
        assert_eq!(PollingStatus::from_status("Updating"), PollingStatus::InProgress);
        assert!(!PollingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_interval() {
        let options = PollingOptions::default();
        assert_eq!(options.interval(None), Duration::from_secs(10));
        assert_eq!(options.interval(Some(Duration::from_secs(5))), Duration::from_secs(5));
        assert_eq!(options.interval(Some(Duration::from_secs(600))), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_async_operation_header() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(
            Response::new(201, json!({"name": "app"}).to_string())
                .with_header("Azure-AsyncOperation", "https://management.example.test/operations/1"),
        );
        sender.respond(200, json!({"status": "InProgress"}));
        sender.respond(200, json!({"status": "Succeeded"}));
        let client = client(sender.clone());

        let mut poller = client
            .execute_long_running(
                "CreateOrUpdate",
                RequestOptions::put("/apps/app").expect(&[200, 201]),
            )
            .await
            .unwrap();
        assert!(!poller.is_done());
        poller.poll_until_done().await.unwrap();
        assert_eq!(poller.status(), PollingStatus::Succeeded);

        let requests = sender.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].url, "https://management.example.test/operations/1");
    }

    #[tokio::test]
    async fn test_async_operation_failure() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(
            Response::new(202, "")
                .with_header("Azure-AsyncOperation", "https://management.example.test/operations/1"),
        );
        sender.respond(
            200,
            json!({"status": "Failed", "error": {"code": "QuotaExceeded", "message": "too many apps"}}),
        );
        let client = client(sender);

        let mut poller = client
            .execute_long_running(
                "Delete",
                RequestOptions::delete("/apps/app").expect(&[200, 202, 204]),
            )
            .await
            .unwrap();
        let err = poller.poll_until_done().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "polling after iotcentral.AppsClient#Delete: QuotaExceeded: too many apps"
        );
    }

    #[tokio::test]
    async fn test_async_operation_without_status() {
        for body in ["not json", r#"{"name": "op1"}"#] {
            let sender = Arc::new(MockSender::new());
            sender.respond_raw(
                Response::new(202, "").with_header(
                    "Azure-AsyncOperation",
                    "https://management.example.test/operations/1",
                ),
            );
            sender.respond_raw(Response::new(200, body));
            let client = client(sender.clone());

            let mut poller = client
                .execute_long_running("Delete", RequestOptions::delete("/apps/app").expect(&[202]))
                .await
                .unwrap();
            let err = poller.poll_until_done().await.unwrap_err();
            assert!(matches!(err, ClientError::Polling { .. }));
            assert!(err.to_string().contains("has no status"));
            assert_eq!(sender.requests().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_location_header() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(
            Response::new(202, "")
                .with_header("Location", "https://management.example.test/results/1"),
        );
        sender.respond_raw(Response::new(202, ""));
        sender.respond_raw(Response::new(204, ""));
        let client = client(sender.clone());

        let mut poller = client
            .execute_long_running("Delete", RequestOptions::delete("/rg").expect(&[200, 202]))
            .await
            .unwrap();
        poller.poll_until_done().await.unwrap();
        assert_eq!(sender.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_provisioning_state() {
        let sender = Arc::new(MockSender::new());
        sender.respond(201, json!({"properties": {"provisioningState": "Creating"}}));
        sender.respond(200, json!({"properties": {"provisioningState": "Updating"}}));
        sender.respond(200, json!({"properties": {"provisioningState": "Succeeded"}}));
        let client = client(sender.clone());

        let mut poller = client
            .execute_long_running(
                "CreateOrUpdate",
                RequestOptions::put("/apps/app").expect(&[200, 201]),
            )
            .await
            .unwrap();
        poller.poll_until_done().await.unwrap();

        let requests = sender.requests();
        assert_eq!(requests[1].method, Method::GET);
        assert_eq!(
            requests[1].url,
            "https://management.example.test/apps/app?api-version=2021-06-01"
        );
    }

    #[tokio::test]
    async fn test_already_done() {
        let sender = Arc::new(MockSender::new());
        sender.respond(200, json!({"properties": {"provisioningState": "Succeeded"}}));
        let client = client(sender.clone());

        let mut poller = client
            .execute_long_running("Update", RequestOptions::patch("/apps/app"))
            .await
            .unwrap();
        assert!(poller.is_done());
        poller.poll_until_done().await.unwrap();
        assert_eq!(sender.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_provisioning_state_in_initial_response() {
        let sender = Arc::new(MockSender::new());
        sender.respond(200, json!({"properties": {"provisioningState": "Failed"}}));
        let client = client(sender);

        let mut poller = client
            .execute_long_running("Update", RequestOptions::patch("/apps/app"))
            .await
            .unwrap();
        assert_eq!(poller.status(), PollingStatus::Failed);
        assert!(matches!(
            poller.poll_until_done().await,
            Err(ClientError::Polling { .. })
        ));
    }
}
