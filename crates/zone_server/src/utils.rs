//! Factory helpers for zone servers.

use crate::{config::ZoneServerConfig, server::ZoneServer};

/// Creates a zone server with custom configuration.
///
/// # Arguments
///
/// * `config` - Validated zone server settings
pub fn create_zone_server_with_config(config: ZoneServerConfig) -> ZoneServer {
    ZoneServer::new(config)
}
