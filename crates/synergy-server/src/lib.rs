//! Synergy Node - HTTP service for the Synergy dashboard
//!
//! Serves blueprint generation, Pi valuation, market estimates, the company
//! directory and the Pi Platform login/payment hand-off as a JSON API.
//!
//! # Architecture
//!
//! - **Config**: environment-driven [`ServerConfig`]
//! - **API**: axum router over shared [`SynergyState`]
//! - **Gallery**: in-memory store of generated blueprints
//! - **Pi client**: reqwest client for the Pi Platform API
//! - **Partner**: signed bridge to the Triumph partner app
//!
//! # Example
//!
//! ```no_run
//! use synergy_server::{ServerConfig, SynergyNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     let node = SynergyNode::new(config).await?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod node;
pub mod partner;
pub mod pi_client;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use gallery::Gallery;
pub use node::{SynergyNode, SynergyState};
pub use partner::{PartnerClient, PartnerError};
pub use pi_client::{PiClient, PiError, PiUser};
