//! The provider surface: the operations the plugin host calls.
//!
//! [`ProviderService`] is the protocol-level trait: schema and metadata,
//! provider configuration, resource validation, state upgrades, plan, CRUD,
//! import and data sources. [`AzureRmProvider`] implements it over a registry
//! of [`Resource`] and [`DataSource`] trait objects and the [`Clients`] built
//! by `configure`.
//!
//! Every resource operation runs under the resource's [`Timeouts`]; an
//! operation that overruns fails with [`ProviderError::DeadlineExceeded`].
//!
//! [`Timeouts`]: crate::resource::Timeouts

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::{BaseClient, PollingOptions, ReqwestSender, RetryOptions, Sender};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resource::{DataSource, Resource};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::services::{self, Clients};
use crate::types::{diff, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};

/// The operations a provider exposes to the plugin host.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// The provider block, resource and data source schemas.
    fn schema(&self) -> ProviderSchema;

    /// Resource and data source names. Derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
            capabilities: Default::default(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider. Problems with the configuration are returned
    /// as error diagnostics.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Upgrade state written under schema `version` to the current version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError>;

    /// Plan a change. A null `proposed_state` plans the resource's destruction.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh a resource. `Value::Null` means it no longer exists.
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError>;

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError>;

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError>;
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The azurerm provider.
pub struct AzureRmProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
    sender: Arc<dyn Sender>,
    retry: RetryOptions,
    polling: PollingOptions,
    env: EnvLookup,
    clients: RwLock<Option<Arc<Clients>>>,
}

impl fmt::Debug for AzureRmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureRmProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("sender", &self.sender)
            .field("retry", &self.retry)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl Default for AzureRmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureRmProvider {
    /// A provider serving every built-in resource and data source.
    pub fn new() -> Self {
        let provider = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            sender: Arc::new(ReqwestSender::new()),
            retry: RetryOptions::default(),
            polling: PollingOptions::default(),
            env: Arc::new(|key| std::env::var(key).ok()),
            clients: RwLock::new(None),
        };
        let provider = services::resources()
            .into_iter()
            .fold(provider, Self::with_resource);
        services::data_sources()
            .into_iter()
            .fold(provider, Self::with_data_source)
    }

    pub fn with_resource(mut self, resource: Arc<dyn Resource>) -> Self {
        self.resources.insert(resource.type_name(), resource);
        self
    }

    pub fn with_data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_sources.insert(data_source.type_name(), data_source);
        self
    }

    /// Send requests through `sender` instead of the network.
    pub fn with_sender(mut self, sender: Arc<dyn Sender>) -> Self {
        self.sender = sender;
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

    /// Read `ARM_*` fallbacks through `lookup` instead of the process environment.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    async fn clients(&self) -> Result<Arc<Clients>, ProviderError> {
        self.clients.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("the provider has not been configured".to_string())
        })
    }

    /// Fill defaults and carry computed values over from `prior`. Values that
    /// differ from `prior` only in a suppressed way keep the prior value.
    fn planned_state(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> Value {
        let mut planned: Map<String, Value> = proposed.as_object().cloned().unwrap_or_default();
        for (name, attr) in &schema.block.attributes {
            if let Some(value) = planned.get_mut(name).filter(|v| !v.is_null()) {
                let old = prior.and_then(|p| p.get(name)).filter(|v| !v.is_null());
                let suppressed =
                    old.filter(|old| *old != value && attr.suppresses_diff(old, value));
                if let Some(old) = suppressed {
                    *value = old.clone();
                }
                continue;
            }
            let carried = if attr.flags.computed {
                prior
                    .and_then(|p| p.get(name))
                    .filter(|v| !v.is_null())
                    .cloned()
            } else {
                None
            };
            if let Some(value) = carried.or_else(|| attr.default.clone()) {
                planned.insert(name.clone(), value);
            }
        }
        Value::Object(planned)
    }
}

/// A duration as Terraform prints it, e.g. `1h30m0s` or `50ms`.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return format!("{}ms", duration.as_millis());
    }
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

async fn with_timeout<T, F>(
    limit: Duration,
    action: &str,
    resource_type: &str,
    fut: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(resource_type, action, limit = %format_duration(limit), "operation timed out");
            Err(ProviderError::DeadlineExceeded(format!(
                "{} {}: timed out after {}",
                action,
                resource_type,
                format_duration(limit)
            )))
        },
    }
}

fn validation_error(resource_type: &str, diagnostics: &[Diagnostic]) -> ProviderError {
    let summaries: Vec<&str> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
    ProviderError::Validation(format!("{}: {}", resource_type, summaries.join("; ")))
}

#[async_trait::async_trait]
impl ProviderService for AzureRmProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |schema, (name, resource)| {
                schema.with_resource(*name, resource.schema())
            });
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, data_source)| {
                schema.with_data_source(*name, data_source.schema())
            })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|k| k.to_string()).collect(),
            data_sources: self.data_sources.keys().map(|k| k.to_string()).collect(),
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(ProviderConfig::schema().validate(&config))
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = ProviderConfig::schema().validate(&config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let env = self.env.clone();
        let resolved = match ProviderConfig::from_value_with_env(&config, |key| env(key)) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(error = %err, "invalid provider configuration");
                return Ok(vec![err.into()]);
            },
        };

        let base = BaseClient::from_config(&resolved, self.sender.clone())
            .with_retry_options(self.retry.clone())
            .with_polling_options(self.polling.clone());
        let clients = Clients::new(Arc::new(base), resolved.features);
        *self.clients.write().await = Some(Arc::new(clients));

        info!(
            subscription_id = %resolved.subscription_id,
            environment = resolved.environment.name(),
            "provider configured"
        );
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("stopping provider");
        *self.clients.write().await = None;
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.schema().validate(&config))
    }

    #[instrument(skip(self, state))]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let from = u64::try_from(version).map_err(|_| {
            ProviderError::InvalidRequest(format!("invalid schema version {}", version))
        })?;
        let to = resource.schema().version;
        resource
            .state_upgraders()
            .upgrade(resource_type, from, to, state)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();

        if proposed_state.is_null() {
            return Ok(match prior_state {
                Some(prior) => {
                    PlanResult::with_changes(Value::Null, diff(&prior, &Value::Null), vec![])
                },
                None => PlanResult::no_change(Value::Null),
            });
        }

        let diagnostics = schema.validate(&config);
        let errors: Vec<Diagnostic> =
            diagnostics.into_iter().filter(Diagnostic::is_error).collect();
        if !errors.is_empty() {
            return Err(validation_error(resource_type, &errors));
        }

        let planned = Self::planned_state(&schema, prior_state.as_ref(), &proposed_state);
        let Some(prior) = prior_state.filter(|p| !p.is_null()) else {
            let changes = diff(&Value::Null, &planned);
            return Ok(PlanResult::with_changes(planned, changes, vec![]));
        };

        let changes = diff(&prior, &planned);
        if changes.is_empty() {
            return Ok(PlanResult::no_change(prior));
        }
        let force_new = schema.force_new_attributes();
        let replace_paths: Vec<String> = changes
            .iter()
            .filter(|c| force_new.contains(&c.path.as_str()))
            .map(|c| c.path.clone())
            .collect();
        debug!(resource_type, changes = changes.len(), replace = ?replace_paths, "planned update");
        Ok(PlanResult::with_changes(planned, changes, replace_paths))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let clients = self.clients().await?;
        with_timeout(
            resource.timeouts().create,
            "creating",
            resource_type,
            resource.create(&clients, planned_state),
        )
        .await
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let clients = self.clients().await?;
        let state = with_timeout(
            resource.timeouts().read,
            "reading",
            resource_type,
            resource.read(&clients, current_state),
        )
        .await?;
        Ok(state.unwrap_or(Value::Null))
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let clients = self.clients().await?;
        with_timeout(
            resource.timeouts().update,
            "updating",
            resource_type,
            resource.update(&clients, prior_state, planned_state),
        )
        .await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let clients = self.clients().await?;
        with_timeout(
            resource.timeouts().delete,
            "deleting",
            resource_type,
            resource.delete(&clients, current_state),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.validate_id(id)?;
        let clients = self.clients().await?;

        let state = with_timeout(
            resource.timeouts().read,
            "importing",
            resource_type,
            resource.read(&clients, json!({ "id": id })),
        )
        .await?
        .ok_or_else(|| {
            ProviderError::NotFound(format!(
                "{} {:?} does not exist and cannot be imported",
                resource_type, id
            ))
        })?;

        info!(resource_type, id, "imported resource");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type)?.schema().validate(&config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let diagnostics = data_source.schema().validate(&config);
        let errors: Vec<Diagnostic> =
            diagnostics.into_iter().filter(Diagnostic::is_error).collect();
        if !errors.is_empty() {
            return Err(validation_error(data_source_type, &errors));
        }

        let clients = self.clients().await?;
        with_timeout(
            data_source.read_timeout(),
            "reading",
            data_source_type,
            data_source.read(&clients, config),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Response;
    use crate::migration::{RawState, StateUpgrader, StateUpgraders};
    use crate::resource::Timeouts;
    use crate::schema::Attribute;
    use crate::testing::MockSender;
    use std::collections::HashMap;

    const RG_ID: &str = "/subscriptions/sub/resourceGroups/example";

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn provider(sender: Arc<MockSender>) -> AzureRmProvider {
        AzureRmProvider::new()
            .with_sender(sender)
            .with_retry_options(RetryOptions::immediate(3))
            .with_polling_options(PollingOptions::immediate())
            .with_env_lookup(env(&[]))
    }

    async fn configured(sender: Arc<MockSender>) -> AzureRmProvider {
        let provider = provider(sender);
        let diagnostics = provider
            .configure(json!({"subscription_id": "sub", "access_token": "token"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        provider
    }

    /// A resource whose create never finishes in time.
    struct SlowResource;

    #[async_trait::async_trait]
    impl Resource for SlowResource {
        fn type_name(&self) -> &'static str {
            "azurerm_slow"
        }

        fn schema(&self) -> Schema {
            Schema::new(2).with_attribute("name", Attribute::required_string())
        }

        fn timeouts(&self) -> Timeouts {
            Timeouts::with_write(Duration::from_millis(20))
        }

        fn state_upgraders(&self) -> StateUpgraders {
            StateUpgraders::new().with_step(0, Rename("v1")).with_step(1, Rename("v2"))
        }

        fn validate_id(&self, _id: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn create(&self, _clients: &Clients, planned: Value) -> Result<Value, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(planned)
        }

        async fn read(
            &self,
            _clients: &Clients,
            state: Value,
        ) -> Result<Option<Value>, ProviderError> {
            Ok(Some(state))
        }

        async fn update(
            &self,
            _clients: &Clients,
            _prior: Value,
            planned: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned)
        }

        async fn delete(&self, _clients: &Clients, _state: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    struct Rename(&'static str);

    impl StateUpgrader for Rename {
        fn schema(&self) -> Schema {
            Schema::v0()
        }

        fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
            raw.insert("name".to_string(), json!(self.0));
            Ok(raw)
        }
    }

    #[test]
    fn test_metadata_and_schema() {
        let provider = AzureRmProvider::new();
        let metadata = provider.metadata();
        assert_eq!(
            metadata.resources,
            vec!["azurerm_iotcentral_application", "azurerm_resource_group"]
        );
        assert_eq!(metadata.data_sources, vec!["azurerm_resource_group"]);
        assert!(metadata.capabilities.plan_destroy);

        let schema = provider.schema();
        assert_eq!(schema.resources["azurerm_iotcentral_application"].version, 1);
        assert!(schema.provider.attribute("subscription_id").is_some());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30 * 60)), "30m0s");
        assert_eq!(format_duration(Duration::from_secs(90 * 60)), "1h30m0s");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_millis(20)), "20ms");
    }

    #[tokio::test]
    async fn test_operations_require_configure() {
        let provider = provider(Arc::new(MockSender::new()));
        let err = provider
            .read("azurerm_resource_group", json!({"id": RG_ID}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_credentials() {
        let provider = provider(Arc::new(MockSender::new()));
        let diagnostics = provider
            .configure(json!({"subscription_id": "sub"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].summary.contains("access_token"));
    }

    #[tokio::test]
    async fn test_configure_from_environment() {
        let provider = provider(Arc::new(MockSender::new()))
            .with_env_lookup(env(&[("ARM_SUBSCRIPTION_ID", "sub"), ("ARM_ACCESS_TOKEN", "token")]));
        let diagnostics = provider.configure(json!({})).await.unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(provider.clients().await.unwrap().subscription_id(), "sub");
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = configured(Arc::new(MockSender::new())).await;
        let err = provider.create("azurerm_nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let provider = provider(Arc::new(MockSender::new()));
        let diagnostics = provider
            .validate_resource_config("azurerm_resource_group", json!({"location": "westeurope"}))
            .await
            .unwrap();
        assert!(diagnostics.iter().any(|d| d.summary.contains("'name'")));
    }

    #[tokio::test]
    async fn test_plan_create_fills_defaults() {
        let provider = provider(Arc::new(MockSender::new()));
        let config = json!({
            "name": "app1",
            "resource_group_name": "rg",
            "location": "westeurope",
            "sub_domain": "app1"
        });
        let plan = provider
            .plan("azurerm_iotcentral_application", None, config.clone(), config)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["sku"], "ST1");
        assert_eq!(plan.planned_state["public_network_access_enabled"], true);
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let provider = provider(Arc::new(MockSender::new()));
        let config = json!({"name": "bad/name", "location": "westeurope"});
        let err = provider
            .plan("azurerm_resource_group", None, config.clone(), config)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_plan_update_and_replace() {
        let provider = provider(Arc::new(MockSender::new()));
        let prior = json!({"id": RG_ID, "name": "example", "location": "westeurope", "tags": {}});

        let proposed = json!({"name": "example", "location": "westeurope", "tags": {"env": "prod"}});
        let plan = provider
            .plan("azurerm_resource_group", Some(prior.clone()), proposed.clone(), proposed)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["id"], RG_ID);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "tags");

        let proposed = json!({"name": "example", "location": "eastus", "tags": {}});
        let plan = provider
            .plan("azurerm_resource_group", Some(prior.clone()), proposed.clone(), proposed)
            .await
            .unwrap();
        assert!(plan.requires_replace);
        assert_eq!(plan.replace_paths, vec!["location"]);

        let plan = provider
            .plan("azurerm_resource_group", Some(prior.clone()), prior.clone(), prior.clone())
            .await
            .unwrap();
        assert!(!plan.has_changes());

        let plan = provider
            .plan("azurerm_resource_group", Some(prior), Value::Null, Value::Null)
            .await
            .unwrap();
        assert!(plan.planned_state.is_null());
        assert!(plan.has_changes());
    }

    #[tokio::test]
    async fn test_plan_ignores_location_spelling() {
        let provider = provider(Arc::new(MockSender::new()));
        let prior = json!({"id": RG_ID, "name": "example", "location": "westeurope", "tags": {}});

        let proposed = json!({"name": "example", "location": "West Europe", "tags": {}});
        let plan = provider
            .plan("azurerm_resource_group", Some(prior.clone()), proposed.clone(), proposed)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert!(!plan.has_changes());
        assert_eq!(plan.planned_state["location"], "westeurope");

        let proposed = json!({"name": "example", "location": "West Europe", "tags": {"env": "prod"}});
        let plan = provider
            .plan("azurerm_resource_group", Some(prior.clone()), proposed.clone(), proposed)
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "tags");
        assert_eq!(plan.planned_state["location"], "westeurope");

        let proposed = json!({"name": "example", "location": "North Europe", "tags": {}});
        let plan = provider
            .plan("azurerm_resource_group", Some(prior), proposed.clone(), proposed)
            .await
            .unwrap();
        assert_eq!(plan.replace_paths, vec!["location"]);
    }

    #[tokio::test]
    async fn test_read_gone_is_null() {
        let sender = Arc::new(MockSender::new());
        let provider = configured(sender.clone()).await;
        sender.respond_raw(Response::new(404, ""));

        let state = provider
            .read("azurerm_resource_group", json!({"id": RG_ID}))
            .await
            .unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_import() {
        let sender = Arc::new(MockSender::new());
        let provider = configured(sender.clone()).await;
        sender.respond(200, json!({"id": RG_ID, "name": "example", "location": "westeurope"}));

        let imported = provider
            .import_resource("azurerm_resource_group", RG_ID)
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["name"], "example");

        let err = provider
            .import_resource("azurerm_resource_group", "/subscriptions/sub/resourcegroups/example")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidId(_)));

        sender.respond_raw(Response::new(404, ""));
        let err = provider
            .import_resource("azurerm_resource_group", RG_ID)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let provider = configured(Arc::new(MockSender::new()))
            .await
            .with_resource(Arc::new(SlowResource));
        let err = provider
            .create("azurerm_slow", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::DeadlineExceeded(_)));
        assert_eq!(err.message(), "creating azurerm_slow: timed out after 20ms");
    }

    #[tokio::test]
    async fn test_upgrade_resource_state() {
        let provider = provider(Arc::new(MockSender::new())).with_resource(Arc::new(SlowResource));

        let upgraded = provider
            .upgrade_resource_state("azurerm_slow", 0, json!({"name": "v0"}))
            .await
            .unwrap();
        assert_eq!(upgraded["name"], "v2");

        let current = provider
            .upgrade_resource_state("azurerm_slow", 2, json!({"name": "v0"}))
            .await
            .unwrap();
        assert_eq!(current["name"], "v0");

        let err = provider
            .upgrade_resource_state("azurerm_slow", -1, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_upgrade_iotcentral_state() {
        let provider = provider(Arc::new(MockSender::new()));
        let upgraded = provider
            .upgrade_resource_state(
                "azurerm_iotcentral_application",
                0,
                json!({"id": "/subscriptions/sub/resourcegroups/rg/providers/Microsoft.IoTCentral/iotapps/app1"}),
            )
            .await
            .unwrap();
        assert_eq!(
            upgraded["id"],
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.IoTCentral/IoTApps/app1"
        );
    }

    #[tokio::test]
    async fn test_read_data_source() {
        let sender = Arc::new(MockSender::new());
        let provider = configured(sender.clone()).await;
        sender.respond(200, json!({"name": "example", "location": "westeurope"}));

        let state = provider
            .read_data_source("azurerm_resource_group", json!({"name": "example"}))
            .await
            .unwrap();
        assert_eq!(state["id"], RG_ID);

        let err = provider
            .read_data_source("azurerm_resource_group", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
