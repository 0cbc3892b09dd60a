//! Ghost program module
//!
//! # WARNING: Protocol Instability
//! The Ghost program is not ours. Seeds, layouts and discriminators here
//! mirror the deployed program and may break silently after a redeploy.

pub mod accounts;
pub mod events;
pub mod instruction;
pub mod program;

// Re-export commonly used types
pub use accounts::{GhostSystemState, GhostUserSummary};
pub use events::{find_claim_event, GhostClaimEvent};
pub use program::{GhostProgram, GHOST_MINT, GHOST_PROGRAM_ID, MINTS_PER_LEVEL};
