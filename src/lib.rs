//! Nonce Search Worker
//!
//! A short-lived proof-of-work worker for a mining pool:
//! - Decodes a block header template and a nonce range
//! - Hashes every candidate and classifies it against the pool and target difficulties
//! - Reports solutions and a final share count to the pool coordinator over TCP

pub mod blob;
pub mod config;
pub mod crypto;
pub mod difficulty;
pub mod error;
pub mod report;
pub mod types;
pub mod utils;
pub mod worker;

pub use blob::Blob;
pub use config::Config;
pub use crypto::{Blake2sHasher, PowHasher};
pub use error::{Error, Result};
pub use report::{ChannelReportClient, ReportClient, ReportMessage, TcpReportClient};
pub use types::*;
pub use worker::{NonceSearchLoop, RunSummary, SearchOptions, SearchState};

/// Application information
pub const APP_NAME: &str = "nonce-search-worker";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
