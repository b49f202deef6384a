//! Retries and automatic resource provider registration.

use reqwest::Method;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{Request, ResourceManagerClient, Response};
use crate::error::ClientError;

const PROVIDERS_API_VERSION: &str = "2016-02-01";
const MAX_REGISTRATION_POLLS: u32 = 60;

/// How throttled and transiently failing requests are retried.
///
/// Statuses 429, 500, 502, 503 and 504 are retried until `max_attempts`
/// requests have been made. The delay is the response's `Retry-After` when
/// present, otherwise `base_delay * 2^attempt`; either is capped at
/// `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryOptions {
    /// No delays at all.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub(crate) fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after
            .unwrap_or_else(|| self.base_delay.saturating_mul(2_u32.saturating_pow(attempt)));
        delay.min(self.max_delay)
    }
}

pub(crate) fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// The namespace to register when the response says the subscription is not
/// registered for it.
pub(crate) fn missing_registration(url: &str, response: &Response) -> Option<String> {
    if response.status != 409 {
        return None;
    }
    let (code, message) = response.arm_error()?;
    if !code.eq_ignore_ascii_case("MissingSubscriptionRegistration") {
        return None;
    }
    namespace_from_message(&message).or_else(|| namespace_from_url(url))
}

/// `... is not registered to use namespace 'Microsoft.IoTCentral'. ...`
fn namespace_from_message(message: &str) -> Option<String> {
    let start = message.find("namespace '")? + "namespace '".len();
    let rest = &message[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string()).filter(|ns| !ns.is_empty())
}

/// The first component after `/providers/` in a URL's path.
fn namespace_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let mut components = path.split('/');
    while let Some(component) = components.next() {
        if component.eq_ignore_ascii_case("providers") {
            return components
                .next()
                .filter(|ns| !ns.is_empty())
                .map(str::to_string);
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderRegistration {
    #[serde(default)]
    registration_state: Option<String>,
}

impl ResourceManagerClient {
    /// Register `namespace` on the subscription and wait until it is
    /// registered. Namespaces already registered by this process are skipped.
    pub(super) async fn ensure_registered(&self, namespace: &str) -> Result<(), ClientError> {
        let key = namespace.to_ascii_lowercase();
        let mut registered = self.base.registered_namespaces.lock().await;
        if registered.contains(&key) {
            return Ok(());
        }

        let providers = ResourceManagerClient::new(
            self.base.clone(),
            "resources.ProvidersClient",
            PROVIDERS_API_VERSION,
        );
        let provider_path = format!(
            "/subscriptions/{}/providers/{}",
            self.base.subscription_id,
            urlencoding::encode(namespace)
        );
        let registration_error = |message: String| ClientError::Registration {
            namespace: namespace.to_string(),
            message,
        };

        info!(namespace, "registering resource provider");
        let register_url = providers.url(&format!("{}/register", provider_path), &[]);
        let response = providers
            .send_once("Register", Request::new(Method::POST, register_url))
            .await?;
        if response.status != 200 {
            return Err(registration_error(
                providers.unexpected_status("Register", &response).to_string(),
            ));
        }

        let status_url = providers.url(&provider_path, &[]);
        for poll in 0..MAX_REGISTRATION_POLLS {
            let response = providers
                .send_once("Get", Request::new(Method::GET, status_url.clone()))
                .await?;
            if response.status != 200 {
                return Err(registration_error(
                    providers.unexpected_status("Get", &response).to_string(),
                ));
            }
            let state: ProviderRegistration = providers.decode("Get", &response)?;
            let state = state.registration_state.unwrap_or_default();
            debug!(namespace, poll, state = %state, "polled resource provider registration");
            if state.eq_ignore_ascii_case("Registered") {
                registered.insert(key);
                return Ok(());
            }
            let interval = self.base.polling.interval(response.retry_after());
            tokio::time::sleep(interval).await;
        }

        Err(registration_error(format!(
            "not registered after {} polls",
            MAX_REGISTRATION_POLLS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RequestOptions;
    use crate::testing::{test_base_client, MockSender};
    use serde_json::json;
    use std::sync::Arc;

    fn missing_registration_response() -> Response {
        Response::new(
            409,
            json!({"error": {
                "code": "MissingSubscriptionRegistration",
                "message": "The subscription is not registered to use namespace 'Microsoft.IoTCentral'. See https://aka.ms/rps-not-found for how to register subscriptions."
            }})
            .to_string(),
        )
    }

    #[test]
    fn test_delay() {
        let options = RetryOptions {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(options.delay(0, None), Duration::from_millis(100));
        assert_eq!(options.delay(2, None), Duration::from_millis(400));
        assert_eq!(options.delay(10, None), Duration::from_secs(1));
        assert_eq!(options.delay(0, Some(Duration::from_secs(30))), Duration::from_secs(1));
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable(status));
        }
        for status in [200, 400, 404, 409, 501] {
            assert!(!is_retryable(status));
        }
    }

    #[test]
    fn test_namespace_detection() {
        let url = "https://management.azure.com/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/serverFarms/p?api-version=1";
        assert_eq!(
            missing_registration(url, &missing_registration_response()),
            Some("Microsoft.IoTCentral".to_string())
        );

        let bare = Response::new(
            409,
            json!({"error": {"code": "MissingSubscriptionRegistration", "message": ""}}).to_string(),
        );
        assert_eq!(missing_registration(url, &bare), Some("Microsoft.Web".to_string()));

        let conflict = Response::new(409, json!({"error": {"code": "Conflict"}}).to_string());
        assert_eq!(missing_registration(url, &conflict), None);
    }

    #[tokio::test]
    async fn test_retries_throttled_requests() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(Response::new(429, "").with_header("Retry-After", "1"));
        sender.respond(503, json!({}));
        sender.respond(200, json!({"ok": true}));
        let client =
            ResourceManagerClient::new(Arc::new(test_base_client(sender.clone())), "c", "v");

        let response = client.execute("Get", RequestOptions::get("/x")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(sender.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sender = Arc::new(MockSender::new());
        for _ in 0..3 {
            sender.respond(500, json!({"error": {"code": "InternalServerError", "message": "boom"}}));
        }
        let client =
            ResourceManagerClient::new(Arc::new(test_base_client(sender.clone())), "c", "v");

        let err = client.execute("Get", RequestOptions::get("/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(sender.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_registers_missing_provider_then_retries() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(missing_registration_response());
        sender.respond(200, json!({"registrationState": "Registering"}));
        sender.respond(200, json!({"registrationState": "Registering"}));
        sender.respond(200, json!({"registrationState": "Registered"}));
        sender.respond(200, json!({"name": "app"}));
        let client =
            ResourceManagerClient::new(Arc::new(test_base_client(sender.clone())), "c", "v");

        let response = client
            .execute(
                "CreateOrUpdate",
                RequestOptions::put(
                    "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.IoTCentral/iotApps/app",
                ),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let requests = sender.requests();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[1].method, Method::POST);
        assert!(requests[1]
            .url
            .contains("/subscriptions/sub/providers/Microsoft.IoTCentral/register?api-version=2016-02-01"));
        assert_eq!(requests[4].method, Method::PUT);
    }

    #[tokio::test]
    async fn test_skip_provider_registration() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(missing_registration_response());
        let base = test_base_client(sender.clone()).with_skip_provider_registration(true);
        let client = ResourceManagerClient::new(Arc::new(base), "c", "v");

        let err = client.execute("Get", RequestOptions::get("/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(sender.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_registration() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(missing_registration_response());
        sender.respond(403, json!({"error": {"code": "AuthorizationFailed", "message": "no"}}));
        let client =
            ResourceManagerClient::new(Arc::new(test_base_client(sender.clone())), "c", "v");

        let err = client.execute("Get", RequestOptions::get("/x")).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Registration { ref namespace, .. } if namespace == "Microsoft.IoTCentral"
        ));
    }
}
