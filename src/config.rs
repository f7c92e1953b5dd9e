use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Duration as SessionTtl;

use crate::error::{config_error, Error};

pub const DEFAULT_ORS_API_BASE: &str = "https://api.openrouteservice.org";
pub const DEFAULT_ORS_PROFILE: &str = "driving-car";
pub const DEFAULT_ORS_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_ADDRESS_CSV: &str = "geocoded_addresses_obfuscated.csv";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_TTL_SECS: u32 = 60 * 60;

#[derive(Clone)]
pub struct RoutingConfig {
    pub api_key: String,
    pub api_base: String,
    pub profile: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub session_ttl: SessionTtl,
    pub routing: RoutingConfig,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.into())
}

impl Config {
    /// Reads configuration from the process environment. `ORS_API_KEY` is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = env::var("ORS_API_KEY")?;

        let timeout_secs = var_or("ORS_TIMEOUT_SECS", &DEFAULT_ORS_TIMEOUT_SECS.to_string());
        let timeout_secs: u64 = timeout_secs
            .parse()
            .map_err(|_| config_error(format!("ORS_TIMEOUT_SECS={:?}", timeout_secs)))?;

        let listen_addr = var_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|_| config_error(format!("LISTEN_ADDR={:?}", listen_addr)))?;

        let session_ttl = var_or("SESSION_TTL_SECS", &DEFAULT_SESSION_TTL_SECS.to_string());
        let session_ttl: u32 = session_ttl
            .parse()
            .map_err(|_| config_error(format!("SESSION_TTL_SECS={:?}", session_ttl)))?;

        Ok(Self {
            data_path: var_or("ADDRESS_CSV", DEFAULT_ADDRESS_CSV).into(),
            listen_addr,
            session_ttl: SessionTtl::seconds(session_ttl.into()),
            routing: RoutingConfig {
                api_key,
                api_base: var_or("ORS_API_BASE", DEFAULT_ORS_API_BASE),
                profile: var_or("ORS_PROFILE", DEFAULT_ORS_PROFILE),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

#[test]
fn routing_config_debug_hides_key() {
    let config = RoutingConfig {
        api_key: "secret-key".into(),
        api_base: DEFAULT_ORS_API_BASE.into(),
        profile: DEFAULT_ORS_PROFILE.into(),
        timeout: Duration::from_secs(DEFAULT_ORS_TIMEOUT_SECS),
    };

    let debug = format!("{:?}", config);
    assert!(!debug.contains("secret-key"));
    assert!(debug.contains("driving-car"));
}
