//! Node configuration.

use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Pi Platform API endpoint.
pub const DEFAULT_PI_API_BASE_URL: &str = "https://api.minepi.com";

/// Default upper bound on rooms accepted over HTTP.
pub const DEFAULT_MAX_ROOMS: u32 = 64;

/// Default blueprints kept in the in-memory gallery.
pub const DEFAULT_GALLERY_CAPACITY: usize = 256;

/// Default base URL of the Triumph partner app.
pub const DEFAULT_PARTNER_URL: &str = "https://triumph-synergy.vercel.app";

/// Configuration for a Synergy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Server key for the Pi Platform API. Login and payments are
    /// unavailable without it.
    pub pi_api_key: Option<String>,

    /// Pi Platform API base URL
    pub pi_api_base_url: String,

    /// Largest room count a request may ask for
    pub max_rooms: u32,

    /// Company directory file replacing the embedded dataset
    pub directory_path: Option<PathBuf>,

    /// Expected company count for the startup integrity check
    pub expected_companies: Option<usize>,

    /// Blueprints kept before the oldest is evicted
    pub gallery_capacity: usize,

    /// Secret shared with the Triumph partner app. The partner bridge is
    /// disabled without it.
    pub shared_secret_key: Option<String>,

    /// Triumph partner app base URL
    pub partner_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            pi_api_key: None,
            pi_api_base_url: DEFAULT_PI_API_BASE_URL.to_string(),
            max_rooms: DEFAULT_MAX_ROOMS,
            directory_path: None,
            expected_companies: None,
            gallery_capacity: DEFAULT_GALLERY_CAPACITY,
            shared_secret_key: None,
            partner_url: DEFAULT_PARTNER_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_addr = parse_opt(&get, "SYNERGY_API_ADDR")?.unwrap_or(defaults.api_addr);
        let max_rooms = parse_opt(&get, "SYNERGY_MAX_ROOMS")?.unwrap_or(defaults.max_rooms);
        if max_rooms == 0 {
            return Err(Error::Config("SYNERGY_MAX_ROOMS must be at least 1".into()));
        }

        let gallery_capacity =
            parse_opt(&get, "SYNERGY_GALLERY_CAPACITY")?.unwrap_or(defaults.gallery_capacity);
        if gallery_capacity == 0 {
            return Err(Error::Config("SYNERGY_GALLERY_CAPACITY must be at least 1".into()));
        }

        let pi_api_base_url = get("PI_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.pi_api_base_url);
        let partner_url = get("TRIUMPH_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.partner_url);

        Ok(Self {
            api_addr,
            pi_api_key: get("PI_API_KEY"),
            pi_api_base_url,
            max_rooms,
            directory_path: get("SYNERGY_DIRECTORY_PATH").map(PathBuf::from),
            expected_companies: parse_opt(&get, "SYNERGY_EXPECTED_COMPANIES")?,
            gallery_capacity,
            shared_secret_key: get("SHARED_SECRET_KEY"),
            partner_url,
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|e| Error::Config(format!("Invalid {key} {raw:?}: {e}")))
        })
        .transpose()
}
