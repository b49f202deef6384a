//! Azure Resource Manager provider core.
//!
//! This crate holds the building blocks of the azurerm provider and the
//! provider surface built on top of them.
//!
//! # Overview
//!
//! - **Resource IDs** ([`resourceids`]): segment-based parsing and formatting
//!   of ARM resource IDs, case-sensitive and case-insensitive
//! - **String enums** ([`enums`]): closed value sets that survive unknown
//!   values coming back from the API
//! - **Client** ([`client`]): authenticated requests with retries, provider
//!   registration, paging and long-running operation polling
//! - **State upgrades** ([`migration`]): versioned schema snapshots and the
//!   steps that rewrite old state
//! - **Services** ([`services`]): per-service IDs, models, API clients,
//!   resources and upgraders
//! - **Provider** ([`provider`]): [`ProviderService`] and [`AzureRmProvider`],
//!   the operations the plugin host calls
//!
//! # Quick Start
//!
//! ```ignore
//! use azurerm::{AzureRmProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     azurerm::init_logging();
//!
//!     let provider = AzureRmProvider::new();
//!     let diagnostics = provider
//!         .configure(json!({"subscription_id": "00000000-0000-0000-0000-000000000000"}))
//!         .await?;
//!     assert!(diagnostics.iter().all(|d| !d.is_error()));
//!
//!     let group = provider
//!         .read(
//!             "azurerm_resource_group",
//!             json!({"id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/example"}),
//!         )
//!         .await?;
//!     println!("{}", group);
//!     Ok(())
//! }
//! ```
//!
//! Credentials not set in the provider block are read from the `ARM_*`
//! environment variables.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod enums;
pub mod error;
pub mod logging;
pub mod migration;
pub mod provider;
pub mod resource;
pub mod resourceids;
pub mod schema;
pub mod services;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{AzureRmProvider, ProviderService};
pub use schema::ProviderSchema;
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
};
pub use validation::validate;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
