//! Error types for the azurerm provider.
//!
//! Three layers of errors exist:
//!
//! - [`ClientError`]: a single Azure Resource Manager call failed. Every variant
//!   carries the client and operation name so the failing call can be located.
//! - [`AuthError`]: acquiring a bearer token failed.
//! - [`ProviderError`]: what resource implementations and the provider surface
//!   return. It converts into an error [`Diagnostic`] for display.

use thiserror::Error;

use crate::resourceids::ParseError;
use crate::schema::Diagnostic;

/// Errors that can occur while running provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The provider is not configured or its configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A resource ID could not be parsed.
    #[error("Invalid resource ID: {0}")]
    InvalidId(#[from] ParseError),

    /// A bearer token could not be acquired.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// An Azure API call failed in a way not covered by a more specific variant.
    #[error("Azure API error: {0}")]
    Api(ClientError),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quota or rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// A persisted state could not be migrated to the current schema version.
    #[error("State upgrade failed: {0}")]
    StateUpgrade(String),

    /// Invalid request from the caller.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant that carries one.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Internal(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::InvalidId(_err) => "invalid resource ID (see Debug output)",
            Self::Authentication(_err) => "authentication error (see Debug output)",
            Self::Api(_err) => "Azure API error (see Debug output)",
            Self::AlreadyExists(msg) => msg,
            Self::PermissionDenied(msg) => msg,
            Self::ResourceExhausted(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::FailedPrecondition(msg) => msg,
            Self::StateUpgrade(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// Whether this error means the remote resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api(err) => err.was_not_found(),
            _ => false,
        }
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err.status() {
            Some(404) => ProviderError::NotFound(err.to_string()),
            Some(409) => ProviderError::AlreadyExists(err.to_string()),
            Some(401) | Some(403) => ProviderError::PermissionDenied(err.to_string()),
            Some(429) => ProviderError::ResourceExhausted(err.to_string()),
            Some(status) if status >= 500 => ProviderError::Unavailable(err.to_string()),
            _ => ProviderError::Api(err),
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let diagnostic = Diagnostic::error(err.to_string());
        match &err {
            ProviderError::InvalidId(parse) => diagnostic.with_detail(parse.expected_format()),
            _ => diagnostic,
        }
    }
}

/// Errors raised by a single Azure Resource Manager operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("{client}#{operation}: sending request: {message}")]
    Transport {
        /// Name of the service client.
        client: String,
        /// Name of the operation.
        operation: String,
        /// Transport failure description.
        message: String,
    },

    /// No bearer token could be attached to the request.
    #[error("{client}#{operation}: authorizing request: {source}")]
    Authorization {
        /// Name of the service client.
        client: String,
        /// Name of the operation.
        operation: String,
        /// Underlying credential failure.
        #[source]
        source: AuthError,
    },

    /// The response status was not one the operation expects.
    #[error("{client}#{operation}: unexpected status {status} with error: {code}: {message}")]
    UnexpectedStatus {
        /// Name of the service client.
        client: String,
        /// Name of the operation.
        operation: String,
        /// HTTP status code returned.
        status: u16,
        /// ARM error code, or the status reason when the body carried none.
        code: String,
        /// ARM error message, or the raw body.
        message: String,
    },

    /// The request body could not be serialized.
    #[error("{client}#{operation}: marshaling request: {source}")]
    Encode {
        /// Name of the service client.
        client: String,
        /// Name of the operation.
        operation: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The response body could not be deserialized into the expected model.
    #[error("{client}#{operation}: unmarshaling response: {source}")]
    Decode {
        /// Name of the service client.
        client: String,
        /// Name of the operation.
        operation: String,
        /// Underlying deserializer error.
        #[source]
        source: serde_json::Error,
    },

    /// A page of a paged list failed to load.
    #[error("loading page {page} for {operation}: {source}")]
    Page {
        /// Name of the list operation.
        operation: String,
        /// One-based index of the failing page.
        page: usize,
        /// The failure for that page.
        #[source]
        source: Box<ClientError>,
    },

    /// A long-running operation failed, was cancelled, or could not be polled.
    #[error("polling after {operation}: {message}")]
    Polling {
        /// Name of the operation that started the long-running operation.
        operation: String,
        /// Failure description.
        message: String,
    },

    /// Automatic resource provider registration failed.
    #[error("registering resource provider {namespace}: {message}")]
    Registration {
        /// The resource provider namespace, e.g. `Microsoft.IoTCentral`.
        namespace: String,
        /// Failure description.
        message: String,
    },
}

impl ClientError {
    /// The HTTP status code behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Page { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the remote resource does not exist.
    pub fn was_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors raised while acquiring an access token.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// A setting needed by the credential is missing.
    #[error("missing credential setting: {0}")]
    MissingSetting(String),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Request(String),

    /// The token endpoint rejected the request.
    #[error("token endpoint returned {error}: {description}")]
    Rejected {
        /// OAuth2 error code.
        error: String,
        /// OAuth2 error description.
        description: String,
    },

    /// The token response could not be decoded.
    #[error("decoding token response: {0}")]
    Decode(String),
}
