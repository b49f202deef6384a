//! Bearer tokens for Azure Resource Manager.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{Request, RequestBody, Sender};
use crate::config::{AuthMethod, ProviderConfig};
use crate::error::AuthError;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// A bearer token and when it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` for tokens whose lifetime is unknown.
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    /// Whether the token should still be used at `now`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => now + EXPIRY_MARGIN < expires_at,
            None => true,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies bearer tokens for Resource Manager requests.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self) -> Result<AccessToken, AuthError>;
}

/// A pre-issued token, used as is.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::MissingSetting("access_token".to_string()));
        }
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: None,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// The OAuth2 client credentials grant against the Microsoft identity platform.
///
/// Tokens are cached and refreshed five minutes before they expire.
pub struct ClientSecretCredential {
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
    sender: Arc<dyn Sender>,
    cache: Mutex<Option<AccessToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        authority_host: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
        sender: Arc<dyn Sender>,
    ) -> Self {
        Self {
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            sender,
            cache: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host,
            urlencoding::encode(&self.tenant_id)
        )
    }

    async fn request_token(&self) -> Result<AccessToken, AuthError> {
        let form = vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), self.client_id.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
            ("scope".to_string(), self.scope.clone()),
        ];
        let request = Request::new(Method::POST, self.token_url())
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(RequestBody::Form(form));

        debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "requesting access token");
        let response = self
            .sender
            .send(request)
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if response.status != 200 {
            return Err(match response.json::<TokenErrorResponse>() {
                Ok(err) => AuthError::Rejected {
                    error: err.error,
                    description: err.error_description.unwrap_or_default(),
                },
                Err(_) => AuthError::Request(format!(
                    "token endpoint returned status {}",
                    response.status
                )),
            });
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(AccessToken {
            token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cache = Some(token.clone());
        Ok(token)
    }
}

/// The credential described by a provider configuration.
pub fn credential_from_config(
    config: &ProviderConfig,
    sender: Arc<dyn Sender>,
) -> Arc<dyn TokenCredential> {
    match &config.auth {
        AuthMethod::AccessToken(token) => Arc::new(StaticTokenCredential::new(token.clone())),
        AuthMethod::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => Arc::new(ClientSecretCredential::new(
            config.environment.authority_host(),
            tenant_id.clone(),
            client_id.clone(),
            client_secret.clone(),
            config.environment.token_scope(),
            sender,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Response;
    use crate::testing::MockSender;
    use serde_json::json;

    fn credential(sender: Arc<MockSender>) -> ClientSecretCredential {
        ClientSecretCredential::new(
            "https://login.example.test/",
            "tenant-1",
            "client-1",
            "secret-1",
            "https://management.example.test/.default",
            sender,
        )
    }

    #[tokio::test]
    async fn test_static_token() {
        let token = StaticTokenCredential::new("abc").get_token().await.unwrap();
        assert_eq!(token.token, "abc");
        assert!(token.is_fresh(Instant::now()));

        let err = StaticTokenCredential::new("").get_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingSetting(_)));
    }

    #[tokio::test]
    async fn test_client_secret_request_and_cache() {
        let sender = Arc::new(MockSender::new());
        sender.respond(200, json!({"access_token": "tok-1", "token_type": "Bearer", "expires_in": 3600}));
        let credential = credential(sender.clone());

        assert_eq!(credential.get_token().await.unwrap().token, "tok-1");
        assert_eq!(credential.get_token().await.unwrap().token, "tok-1");

        let requests = sender.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://login.example.test/tenant-1/oauth2/v2.0/token"
        );
        let Some(RequestBody::Form(form)) = &requests[0].body else {
            panic!("expected a form body");
        };
        assert!(form.contains(&("grant_type".to_string(), "client_credentials".to_string())));
        assert!(form.contains(&(
            "scope".to_string(),
            "https://management.example.test/.default".to_string()
        )));
    }

    #[tokio::test]
    async fn test_refreshes_inside_expiry_margin() {
        let sender = Arc::new(MockSender::new());
        sender.respond(200, json!({"access_token": "short", "expires_in": 60}));
        sender.respond(200, json!({"access_token": "long", "expires_in": 3600}));
        let credential = credential(sender.clone());

        assert_eq!(credential.get_token().await.unwrap().token, "short");
        assert_eq!(credential.get_token().await.unwrap().token, "long");
        assert_eq!(sender.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected() {
        let sender = Arc::new(MockSender::new());
        sender.respond_raw(Response::new(
            401,
            json!({"error": "invalid_client", "error_description": "AADSTS7000215: Invalid client secret"})
                .to_string(),
        ));
        let err = credential(sender).get_token().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "token endpoint returned invalid_client: AADSTS7000215: Invalid client secret"
        );
    }
}
