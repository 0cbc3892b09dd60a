//! Ghost Cycler Library
//!
//! Drives a fleet of Solana wallets through the Ghost program's
//! mint → upgrade → claim progression, one wallet at a time.

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod fleet;
pub mod ghost;
pub mod ledger;
pub mod progression;
pub mod state;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
