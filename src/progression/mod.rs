//! Wallet progression rules
//!
//! Tier constants and the pure decision engine built on top of them.

pub mod decision;
pub mod tiers;

pub use decision::{claim_plan, decide, Decision, WaitReason};
pub use tiers::{TierEntry, TierTable, PUBLISHED_TIERS};
