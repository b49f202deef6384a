//! Microsoft.Web: state upgraders for Linux app slots.

mod migration;

pub use migration::{LinuxFunctionAppSlotV0ToV1, LinuxWebAppSlotV0ToV1};
