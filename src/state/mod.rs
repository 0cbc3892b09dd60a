//! On-chain state snapshots
//!
//! Snapshots are built fresh on every poll and discarded after the
//! decision; nothing is cached between cycles.

pub mod fetcher;
pub mod snapshot;

pub use fetcher::StateFetcher;
pub use snapshot::{Snapshot, SystemSnapshot, WalletSnapshot};
