use tracing::debug;

use super::application_resource::IoTCentralApplicationResource;
use super::id::IoTAppId;
use crate::error::ProviderError;
use crate::migration::{normalize_id, RawState, StateUpgrader};
use crate::schema::Schema;

/// Rewrites `id` with the canonical `IoTApps` casing; version 0 stored the
/// ID as returned by the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationV0ToV1;

impl StateUpgrader for ApplicationV0ToV1 {
    fn schema(&self) -> Schema {
        IoTCentralApplicationResource::attributes(Schema::v0())
    }

    fn upgrade(&self, mut raw: RawState) -> Result<RawState, ProviderError> {
        debug!("migrating IoT Central application ID to the canonical casing");
        normalize_id::<IoTAppId>(&mut raw, "id")?;
        Ok(raw)
    }
}
