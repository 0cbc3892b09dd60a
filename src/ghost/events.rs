//! Ghost program event decoding
//!
//! Anchor's `emit!` writes events as `Program data: <base64>` log lines,
//! where the payload is an 8-byte event discriminator followed by the
//! borsh-encoded event.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::program::EVENT_DISCRIMINATORS;
use crate::error::{Error, Result};

const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Emitted by `ghostx_claim`
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct GhostClaimEvent {
    pub user: Pubkey,
    /// Reward paid by this claim (accrued up to now)
    pub amount: u64,
    pub level: u8,
    /// Earliest unix timestamp the next claim pays out
    pub next_claim_time: i64,
    /// Reward the next claim would pay at `next_claim_time`
    pub next_claim_amount: u64,
}

impl GhostClaimEvent {
    /// Encode as the `Program data:` line the program would log
    pub fn to_log_line(&self) -> Result<String> {
        let mut payload = EVENT_DISCRIMINATORS::CLAIM.to_vec();
        let body = borsh::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))?;
        payload.extend_from_slice(&body);
        Ok(format!("{}{}", PROGRAM_DATA_PREFIX, STANDARD.encode(payload)))
    }
}

/// Find the first `GhostClaimEvent` in a list of program logs
///
/// Lines that are not `Program data:` or carry another event are skipped.
/// A claim payload that fails to decode is an error.
pub fn find_claim_event(logs: &[String]) -> Result<Option<GhostClaimEvent>> {
    for line in logs {
        let Some(encoded) = line.strip_prefix(PROGRAM_DATA_PREFIX) else {
            continue;
        };

        let payload = match STANDARD.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };

        if payload.len() < 8 || payload[..8] != EVENT_DISCRIMINATORS::CLAIM {
            continue;
        }

        let mut reader = &payload[8..];
        let event = GhostClaimEvent::deserialize(&mut reader)
            .map_err(|e| Error::EventDecode(format!("GhostClaimEvent: {}", e)))?;
        return Ok(Some(event));
    }

    Ok(None)
}
