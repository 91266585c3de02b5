//! BundleLens classification service collaborators
//!
//! Provides:
//! - An async client for the classification service endpoints
//! - An explicit session context carrying the bearer token
//! - Environment-aware configuration loading

pub mod client;
pub mod config;
pub mod errors;
pub mod session;

pub use client::ClassifierClient;
pub use config::{ClientConfig, ConfigManager, Environment, LoggingConfig};
pub use errors::ClassifierError;
pub use session::{SessionContext, UserProfile};

/// Re-export the contract layer
pub use bundlelens_insights as insights;

/// Classifier crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
