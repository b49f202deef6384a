//! Microsoft.Network: Application Gateway IDs and state upgraders.

mod id;
mod migration;

pub use id::ApplicationGatewayId;
pub use migration::ApplicationGatewayV0ToV1;
