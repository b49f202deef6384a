//! Provider configuration.
//!
//! The `provider "azurerm"` block is read into a [`ProviderConfig`]. Every
//! setting can also come from an `ARM_*` environment variable; a value in the
//! block wins over the environment.

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// An Azure cloud and its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    #[default]
    Public,
    UsGovernment,
    China,
}

impl CloudEnvironment {
    /// Parse an environment name. Both the short form (`usgovernment`) and the
    /// SDK form (`AzureUSGovernmentCloud`) are accepted, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, ProviderError> {
        let lowered = name.trim().to_ascii_lowercase();
        let short = lowered
            .strip_prefix("azure")
            .and_then(|s| s.strip_suffix("cloud"))
            .unwrap_or(&lowered);
        match short {
            "" | "public" => Ok(Self::Public),
            "usgovernment" => Ok(Self::UsGovernment),
            "china" => Ok(Self::China),
            _ => Err(ProviderError::Configuration(format!(
                "unknown environment {:?}: expected one of public, usgovernment, china",
                name
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::UsGovernment => "usgovernment",
            Self::China => "china",
        }
    }

    /// Base URL of Azure Resource Manager, without a trailing slash.
    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            Self::Public => "https://management.azure.com",
            Self::UsGovernment => "https://management.usgovcloudapi.net",
            Self::China => "https://management.chinacloudapi.cn",
        }
    }

    /// Base URL of the Microsoft identity platform.
    pub fn authority_host(&self) -> &'static str {
        match self {
            Self::Public => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
        }
    }

    /// OAuth2 scope for Resource Manager tokens.
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.resource_manager_endpoint())
    }
}

/// Toggles under `features { resource_group { ... } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGroupFeatures {
    /// Refuse to delete a resource group that still contains resources.
    pub prevent_deletion_if_contains_resources: bool,
}

impl Default for ResourceGroupFeatures {
    fn default() -> Self {
        Self {
            prevent_deletion_if_contains_resources: true,
        }
    }
}

/// The `features` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub resource_group: ResourceGroupFeatures,
}

/// How the provider authenticates against Azure AD.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// A pre-issued bearer token.
    AccessToken(String),
    /// The OAuth2 client credentials grant.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// The resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub environment: CloudEnvironment,
    pub auth: AuthMethod,
    pub skip_provider_registration: bool,
    pub features: Features,
    /// Extra text appended to the `User-Agent` header.
    pub user_agent_suffix: Option<String>,
}

impl ProviderConfig {
    /// The schema of the provider block.
    pub fn schema() -> Schema {
        let resource_group = Block::new().with_attribute(
            "prevent_deletion_if_contains_resources",
            Attribute::optional_bool().with_description(
                "Should the azurerm_resource_group resource check that there are no resources within the group before deleting it?",
            ),
        );

        Schema::v0()
            .with_attribute(
                "subscription_id",
                Attribute::optional_string()
                    .with_description("The Subscription ID which should be used. Falls back to ARM_SUBSCRIPTION_ID."),
            )
            .with_attribute(
                "tenant_id",
                Attribute::optional_string()
                    .with_description("The Tenant ID which should be used. Falls back to ARM_TENANT_ID."),
            )
            .with_attribute(
                "client_id",
                Attribute::optional_string()
                    .with_description("The Client ID which should be used. Falls back to ARM_CLIENT_ID."),
            )
            .with_attribute(
                "client_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("The Client Secret which should be used. Falls back to ARM_CLIENT_SECRET."),
            )
            .with_attribute(
                "access_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("A pre-issued Resource Manager access token. Falls back to ARM_ACCESS_TOKEN."),
            )
            .with_attribute(
                "environment",
                Attribute::optional_string()
                    .with_default(Value::String("public".to_string()))
                    .with_description("The Cloud Environment which should be used: public, usgovernment or china."),
            )
            .with_attribute(
                "skip_provider_registration",
                Attribute::optional_bool().with_description(
                    "Should the provider skip registering the Resource Providers it needs?",
                ),
            )
            .with_block(
                "features",
                NestedBlock::list(
                    Block::new().with_block(
                        "resource_group",
                        NestedBlock::list(resource_group).with_max_items(1),
                    ),
                )
                .with_max_items(1),
            )
    }

    /// Read the provider block, falling back to the process environment.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(value, |key| std::env::var(key).ok())
    }

    /// Read the provider block, falling back to `lookup` for `ARM_*` variables.
    pub fn from_value_with_env<F>(value: &Value, lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |attr: &str, env: &str| -> Option<String> {
            value
                .get(attr)
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| lookup(env))
                .filter(|v| !v.trim().is_empty())
        };

        let subscription_id = setting("subscription_id", "ARM_SUBSCRIPTION_ID").ok_or_else(|| {
            ProviderError::Configuration(
                "subscription_id must be set in the provider block or via ARM_SUBSCRIPTION_ID"
                    .to_string(),
            )
        })?;

        let environment = match setting("environment", "ARM_ENVIRONMENT") {
            Some(name) => CloudEnvironment::from_name(&name)?,
            None => CloudEnvironment::default(),
        };

        let auth = match setting("access_token", "ARM_ACCESS_TOKEN") {
            Some(token) => AuthMethod::AccessToken(token),
            None => {
                let tenant_id = setting("tenant_id", "ARM_TENANT_ID");
                let client_id = setting("client_id", "ARM_CLIENT_ID");
                let client_secret = setting("client_secret", "ARM_CLIENT_SECRET");
                match (tenant_id, client_id, client_secret) {
                    (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                        AuthMethod::ClientSecret {
                            tenant_id,
                            client_id,
                            client_secret,
                        }
                    },
                    _ => {
                        return Err(ProviderError::Configuration(
                            "either access_token, or all of tenant_id, client_id and client_secret must be set"
                                .to_string(),
                        ))
                    },
                }
            },
        };

        let skip_provider_registration = match value.get("skip_provider_registration") {
            Some(Value::Bool(skip)) => *skip,
            _ => match lookup("ARM_SKIP_PROVIDER_REGISTRATION") {
                Some(raw) => parse_bool("ARM_SKIP_PROVIDER_REGISTRATION", &raw)?,
                None => false,
            },
        };

        Ok(Self {
            subscription_id,
            environment,
            auth,
            skip_provider_registration,
            features: read_features(value.get("features")),
            user_agent_suffix: lookup("AZURE_HTTP_USER_AGENT").filter(|v| !v.is_empty()),
        })
    }

    /// The `User-Agent` sent with every request.
    pub fn user_agent(&self) -> String {
        let base = format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        match &self.user_agent_suffix {
            Some(suffix) => format!("{};{}", base, suffix),
            None => base,
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ProviderError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ProviderError::Configuration(format!(
            "{} must be a boolean, got {:?}",
            name, raw
        ))),
    }
}

/// Blocks arrive either as a single object or as a list holding one.
fn single_block(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

fn read_features(value: Option<&Value>) -> Features {
    let mut features = Features::default();
    let resource_group = single_block(value).and_then(|f| single_block(f.get("resource_group")));
    if let Some(prevent) = resource_group
        .and_then(|rg| rg.get("prevent_deletion_if_contains_resources"))
        .and_then(Value::as_bool)
    {
        features.resource_group.prevent_deletion_if_contains_resources = prevent;
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(CloudEnvironment::from_name("public").unwrap(), CloudEnvironment::Public);
        assert_eq!(
            CloudEnvironment::from_name("AzureUSGovernmentCloud").unwrap(),
            CloudEnvironment::UsGovernment
        );
        assert_eq!(CloudEnvironment::from_name("CHINA").unwrap(), CloudEnvironment::China);
        assert!(CloudEnvironment::from_name("german").is_err());
        assert_eq!(
            CloudEnvironment::China.token_scope(),
            "https://management.chinacloudapi.cn/.default"
        );
    }

    #[test]
    fn test_block_values() {
        let config = ProviderConfig::from_value_with_env(
            &json!({
                "subscription_id": "00000000-0000-0000-0000-000000000000",
                "tenant_id": "tenant",
                "client_id": "client",
                "client_secret": "secret",
                "environment": "usgovernment",
                "skip_provider_registration": true,
                "features": [{"resource_group": [{"prevent_deletion_if_contains_resources": false}]}]
            }),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.environment, CloudEnvironment::UsGovernment);
        assert!(config.skip_provider_registration);
        assert!(!config.features.resource_group.prevent_deletion_if_contains_resources);
        assert!(matches!(
            config.auth,
            AuthMethod::ClientSecret { ref tenant_id, .. } if tenant_id == "tenant"
        ));
    }

    #[test]
    fn test_environment_fallback() {
        let config = ProviderConfig::from_value_with_env(
            &json!({}),
            env(&[
                ("ARM_SUBSCRIPTION_ID", "sub"),
                ("ARM_ACCESS_TOKEN", "token"),
                ("ARM_SKIP_PROVIDER_REGISTRATION", "TRUE"),
            ]),
        )
        .unwrap();

        assert_eq!(config.subscription_id, "sub");
        assert_eq!(config.auth, AuthMethod::AccessToken("token".to_string()));
        assert!(config.skip_provider_registration);
        assert!(config.features.resource_group.prevent_deletion_if_contains_resources);
        assert_eq!(config.environment, CloudEnvironment::Public);
    }

    #[test]
    fn test_block_overrides_environment() {
        let config = ProviderConfig::from_value_with_env(
            &json!({"subscription_id": "from-block", "access_token": "t"}),
            env(&[("ARM_SUBSCRIPTION_ID", "from-env")]),
        )
        .unwrap();
        assert_eq!(config.subscription_id, "from-block");
    }

    #[test]
    fn test_missing_settings() {
        let err = ProviderConfig::from_value_with_env(&json!({}), env(&[])).unwrap_err();
        assert!(err.to_string().contains("subscription_id"));

        let err = ProviderConfig::from_value_with_env(
            &json!({"subscription_id": "sub", "client_id": "c"}),
            env(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));

        let err = ProviderConfig::from_value_with_env(
            &json!({"subscription_id": "sub", "access_token": "t"}),
            env(&[("ARM_SKIP_PROVIDER_REGISTRATION", "maybe")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ARM_SKIP_PROVIDER_REGISTRATION"));
    }

    #[test]
    fn test_user_agent_and_redaction() {
        let config = ProviderConfig::from_value_with_env(
            &json!({"subscription_id": "sub", "access_token": "super-secret"}),
            env(&[("AZURE_HTTP_USER_AGENT", "cloud-shell/1.0")]),
        )
        .unwrap();
        assert!(config.user_agent().starts_with("terraform-provider-azurerm/"));
        assert!(config.user_agent().ends_with(";cloud-shell/1.0"));
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_schema_marks_secrets_sensitive() {
        let schema = ProviderConfig::schema();
        assert!(schema.block.attributes["client_secret"].flags.sensitive);
        assert!(schema.block.attributes["access_token"].flags.sensitive);
        assert!(schema.block.blocks.contains_key("features"));
    }
}
