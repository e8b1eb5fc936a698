use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use common::crypto::SecretKey;

#[derive(Debug)]
pub struct Config {
    // node configuration
    /// the node's identity key,
    ///  if not set then `node_secret_path` is consulted
    pub node_secret: Option<SecretKey>,
    /// on system file path to the node's identity PEM,
    ///  if neither this nor `node_secret` is set then
    ///  a fresh key is generated at startup
    pub node_secret_path: Option<PathBuf>,

    // http server configuration
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:3000 will be used
    pub api_listen_addr: Option<SocketAddr>,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_secret: None,
            node_secret_path: None,
            api_listen_addr: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000)),
            log_level: tracing::Level::INFO,
        }
    }
}
