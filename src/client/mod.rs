//! The shared Azure Resource Manager client.
//!
//! Every service client wraps a [`ResourceManagerClient`], which holds the
//! client name and API version for that service and delegates to a shared
//! [`BaseClient`]. A request goes through the same pipeline for every
//! operation:
//!
//! 1. the URL is built from the endpoint, path, `api-version` and query;
//! 2. a bearer token, `User-Agent` and `Accept` header are attached;
//! 3. the request is handed to the [`Sender`];
//! 4. throttling and transient failures are retried, and a missing resource
//!    provider registration is fixed up (see [`RetryOptions`]);
//! 5. the status is checked against what the operation expects.
//!
//! The [`Sender`] trait is the seam between the pipeline and the network: the
//! provider uses [`ReqwestSender`], tests use `testing::MockSender`.

pub mod auth;
pub mod pager;
pub mod poller;
mod retry;

pub use auth::{
    credential_from_config, AccessToken, ClientSecretCredential, StaticTokenCredential,
    TokenCredential,
};
pub use pager::{MatchAll, Page, Predicate};
pub use poller::{Poller, PollingOptions, PollingStatus};
pub use retry::RetryOptions;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::ClientError;

/// The body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs, used for token requests.
    Form(Vec<(String, String)>),
}

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// The first header with the given name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received HTTP response. Header names are lowercased.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// The `Retry-After` header, when it holds a number of seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// The ARM error code and message from a `{"error": {...}}` body.
    pub fn arm_error(&self) -> Option<(String, String)> {
        let body: Value = serde_json::from_str(&self.body).ok()?;
        let error = body.get("error").unwrap_or(&body);
        let code = error.get("code").and_then(Value::as_str)?;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some((code.to_string(), message.to_string()))
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends requests over the wire.
#[async_trait]
pub trait Sender: Send + Sync + fmt::Debug {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// A [`Sender`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    http: reqwest::Client,
}

impl ReqwestSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sender for ReqwestSender {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// State shared by every service client.
pub struct BaseClient {
    endpoint: String,
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
    sender: Arc<dyn Sender>,
    user_agent: String,
    retry: RetryOptions,
    polling: PollingOptions,
    skip_provider_registration: bool,
    registered_namespaces: Mutex<HashSet<String>>,
}

impl fmt::Debug for BaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClient")
            .field("endpoint", &self.endpoint)
            .field("subscription_id", &self.subscription_id)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("polling", &self.polling)
            .field("skip_provider_registration", &self.skip_provider_registration)
            .finish_non_exhaustive()
    }
}

impl BaseClient {
    pub fn new(
        endpoint: impl Into<String>,
        subscription_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
        sender: Arc<dyn Sender>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            credential,
            sender,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            retry: RetryOptions::default(),
            polling: PollingOptions::default(),
            skip_provider_registration: false,
            registered_namespaces: Mutex::new(HashSet::new()),
        }
    }

    /// Build the shared client for a resolved provider configuration.
    pub fn from_config(config: &ProviderConfig, sender: Arc<dyn Sender>) -> Self {
        let credential = credential_from_config(config, sender.clone());
        Self::new(
            config.environment.resource_manager_endpoint(),
            config.subscription_id.clone(),
            credential,
            sender,
        )
        .with_user_agent(config.user_agent())
        .with_skip_provider_registration(config.skip_provider_registration)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry_options(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_polling_options(mut self, polling: PollingOptions) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_skip_provider_registration(mut self, skip: bool) -> Self {
        self.skip_provider_registration = skip;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn polling_options(&self) -> &PollingOptions {
        &self.polling
    }
}

/// What an operation sends and which statuses it accepts.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Path below the endpoint, e.g. a resource ID.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub expected_statuses: &'static [u16],
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            expected_statuses: &[200],
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append an optional query parameter.
    pub fn with_optional_query<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value.to_string()),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expect(mut self, statuses: &'static [u16]) -> Self {
        self.expected_statuses = statuses;
        self
    }
}

/// A service client: a name and API version on top of the [`BaseClient`].
#[derive(Debug, Clone)]
pub struct ResourceManagerClient {
    base: Arc<BaseClient>,
    name: &'static str,
    api_version: &'static str,
}

impl ResourceManagerClient {
    pub fn new(base: Arc<BaseClient>, name: &'static str, api_version: &'static str) -> Self {
        Self {
            base,
            name,
            api_version,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn api_version(&self) -> &'static str {
        self.api_version
    }

    pub fn base(&self) -> &BaseClient {
        &self.base
    }

    /// Serialize a model into a request body.
    pub fn encode<T: Serialize>(&self, operation: &str, model: &T) -> Result<Value, ClientError> {
        serde_json::to_value(model).map_err(|source| ClientError::Encode {
            client: self.name.to_string(),
            operation: operation.to_string(),
            source,
        })
    }

    /// Deserialize a response body into a model.
    pub fn decode<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: &Response,
    ) -> Result<T, ClientError> {
        response.json().map_err(|source| ClientError::Decode {
            client: self.name.to_string(),
            operation: operation.to_string(),
            source,
        })
    }

    /// The absolute URL for a path, with `api-version` and extra query pairs.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> String {
        let mut url = format!(
            "{}{}?api-version={}",
            self.base.endpoint,
            path,
            urlencoding::encode(self.api_version)
        );
        for (key, value) in query {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Run an operation and check its status.
    #[instrument(
        skip(self, options),
        fields(client = self.name, method = %options.method, path = %options.path)
    )]
    pub async fn execute(
        &self,
        operation: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let url = self.url(&options.path, &options.query);
        let mut request = Request::new(options.method, url);
        if let Some(body) = options.body {
            request = request
                .with_header("Content-Type", "application/json; charset=utf-8")
                .with_body(RequestBody::Json(body));
        }
        let response = self.send(operation, request).await?;
        self.check_status(operation, response, options.expected_statuses)
    }

    /// GET an absolute URL, as returned in `nextLink` or a polling header.
    pub async fn get_url(
        &self,
        operation: &str,
        url: &str,
        expected_statuses: &'static [u16],
    ) -> Result<Response, ClientError> {
        let response = self
            .send(operation, Request::new(Method::GET, url))
            .await?;
        self.check_status(operation, response, expected_statuses)
    }

    fn check_status(
        &self,
        operation: &str,
        response: Response,
        expected_statuses: &[u16],
    ) -> Result<Response, ClientError> {
        if expected_statuses.contains(&response.status) {
            return Ok(response);
        }
        Err(self.unexpected_status(operation, &response))
    }

    pub(crate) fn unexpected_status(&self, operation: &str, response: &Response) -> ClientError {
        let (code, message) = response.arm_error().unwrap_or_else(|| {
            (
                reqwest::StatusCode::from_u16(response.status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown")
                    .to_string(),
                response.body.clone(),
            )
        });
        ClientError::UnexpectedStatus {
            client: self.name.to_string(),
            operation: operation.to_string(),
            status: response.status,
            code,
            message,
        }
    }

    /// Send a request once: attach authorization and common headers.
    pub(crate) async fn send_once(
        &self,
        operation: &str,
        request: Request,
    ) -> Result<Response, ClientError> {
        let token = self
            .base
            .credential
            .get_token()
            .await
            .map_err(|source| ClientError::Authorization {
                client: self.name.to_string(),
                operation: operation.to_string(),
                source,
            })?;

        let outgoing = request
            .with_header("Authorization", format!("Bearer {}", token.token))
            .with_header("User-Agent", self.base.user_agent.clone())
            .with_header("Accept", "application/json");

        debug!(
            client = self.name,
            operation,
            method = %outgoing.method,
            url = %outgoing.url,
            "sending request"
        );

        let response = self
            .base
            .sender
            .send(outgoing)
            .await
            .map_err(|e| ClientError::Transport {
                client: self.name.to_string(),
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        debug!(client = self.name, operation, status = response.status, "received response");
        Ok(response)
    }

    /// Send a request, retrying throttled and transient failures and
    /// registering a missing resource provider once.
    async fn send(&self, operation: &str, request: Request) -> Result<Response, ClientError> {
        let mut attempt: u32 = 0;
        let mut registration_attempted = false;

        loop {
            let response = self.send_once(operation, request.clone()).await?;

            if !registration_attempted && !self.base.skip_provider_registration {
                if let Some(namespace) = retry::missing_registration(&request.url, &response) {
                    registration_attempted = true;
                    self.ensure_registered(&namespace).await?;
                    continue;
                }
            }

            if retry::is_retryable(response.status) && attempt + 1 < self.base.retry.max_attempts {
                let delay = self.base.retry.delay(attempt, response.retry_after());
                warn!(
                    client = self.name,
                    operation,
                    status = response.status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Ok(response);
        }
    }
}
