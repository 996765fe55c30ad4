//! Listener address plus the wired domain services.

use std::net::SocketAddr;

use farmwise::inbound::http::state::HttpState;

/// Everything `create_server` needs to start listening.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr, http_state: HttpState) -> Self {
        Self {
            bind_addr,
            http_state,
        }
    }
}
