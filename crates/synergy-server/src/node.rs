//! Synergy Node - the main application entry point.
//!
//! Architecture:
//! - Single process serving the JSON API for the dashboard
//! - Company directory loaded and checked once at startup
//! - Blueprint gallery kept in memory

use crate::api;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::gallery::Gallery;
use crate::partner::PartnerClient;
use crate::pi_client::PiClient;
use std::sync::Arc;
use synergy_directory::Directory;
use tokio::sync::RwLock;

/// Shared state for the node, handed to every API handler.
pub struct SynergyState {
    pub config: ServerConfig,
    pub directory: Directory,
    pub gallery: Gallery,
    /// Present only when a Pi API key is configured
    pub pi: Option<PiClient>,
    /// Present only when a shared secret is configured
    pub partner: Option<PartnerClient>,
}

impl SynergyState {
    /// Load the directory, run its integrity check, and set up the Pi client.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let directory = match &config.directory_path {
            Some(path) => {
                tracing::info!("Loading company directory from {:?}", path);
                Directory::from_path(path)?
            }
            None => Directory::builtin()?,
        };
        log_integrity(&directory, config.expected_companies);

        let pi = match &config.pi_api_key {
            Some(key) => Some(PiClient::new(config.pi_api_base_url.clone(), key.clone())),
            None => {
                tracing::warn!("PI_API_KEY not set; login and payments are disabled");
                None
            }
        };

        let partner = match &config.shared_secret_key {
            Some(secret) => Some(PartnerClient::new(config.partner_url.clone(), secret.clone())),
            None => {
                tracing::warn!("SHARED_SECRET_KEY not set; the Triumph bridge is disabled");
                None
            }
        };

        Ok(Self {
            gallery: Gallery::with_capacity(config.gallery_capacity),
            config,
            directory,
            pi,
            partner,
        })
    }
}

fn log_integrity(directory: &Directory, expected: Option<usize>) {
    let report = directory.integrity_report(expected);

    for category in &report.categories {
        tracing::debug!("  {}: {} companies", category.name, category.count);
    }
    if !report.count_matches {
        tracing::warn!(
            "Company count mismatch: expected {:?}, found {}",
            report.expected,
            report.total
        );
    }
    for domain in &report.duplicate_domains {
        tracing::warn!("Duplicate company domain: {}", domain);
    }
    if report.is_clean() {
        tracing::info!(
            "Company directory verified: {} companies in {} categories",
            report.total,
            report.categories.len()
        );
    }
}

/// A Synergy node instance.
pub struct SynergyNode {
    state: Arc<RwLock<SynergyState>>,
    config: ServerConfig,
}

impl SynergyNode {
    /// Create a new node.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let state = Arc::new(RwLock::new(SynergyState::new(config.clone())?));
        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<RwLock<SynergyState>> {
        Arc::clone(&self.state)
    }

    /// Run the node (serves the HTTP API until shut down).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Synergy node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Pi API: {}", self.config.pi_api_base_url);
        tracing::info!("  Max rooms: {}", self.config.max_rooms);
        tracing::info!("  Gallery capacity: {}", self.config.gallery_capacity);

        let app = api::build_router(self.state());

        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
