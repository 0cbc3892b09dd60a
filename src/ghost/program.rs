//! Ghost program constants, PDA seeds and discriminators
//!
//! # WARNING: These constants may change without notice
//! The Ghost program has bumped its seed suffix ("...3") on redeploys before.
//! If account fetches start returning nothing for every wallet, the seeds
//! below are the first thing to check.
//!
//! # How discriminators are calculated
//! Anchor uses the first 8 bytes of SHA-256("global:<instruction_name>")
//! for instructions, SHA-256("account:<StructName>") for accounts and
//! SHA-256("event:<StructName>") for emitted events.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Ghost program ID
pub const GHOST_PROGRAM_ID_STR: &str = "231TfDTEzmgtMzqPKgJMBuXaGsisLyfJs1rKz56QkWi1";

/// GHOST token mint
pub const GHOST_MINT_STR: &str = "7EsVJBgkBJ4XwuL1oQPPK4EBicwSFCjcwkSCRHCYbC1G";

/// GHOST token decimals
pub const GHOST_DECIMALS: u8 = 8;

/// Mints allowed per tier before an upgrade is required
pub const MINTS_PER_LEVEL: u8 = 10;

lazy_static::lazy_static! {
    /// Ghost program ID as Pubkey
    pub static ref GHOST_PROGRAM_ID: Pubkey =
        Pubkey::from_str(GHOST_PROGRAM_ID_STR).expect("Invalid ghost program ID");

    /// GHOST mint as Pubkey
    pub static ref GHOST_MINT: Pubkey =
        Pubkey::from_str(GHOST_MINT_STR).expect("Invalid ghost mint");
}

/// PDA seeds
#[allow(non_snake_case)]
pub mod SEEDS {
    /// Per-wallet summary account: [USER_SUMMARY, wallet]
    pub const USER_SUMMARY: &[u8] = b"GhostUserSummary3";

    /// Global aggregate counters
    pub const SYSTEM_STATE: &[u8] = b"GhostSystemState3";

    /// Mint authority for the GHOST token
    pub const MINT_AUTHORITY: &[u8] = b"GhostMintAuthority3";

    /// Token vault holding staked GHOST
    pub const STAKE_VAULT: &[u8] = b"GhostStakeVault3";
}

/// Instruction discriminators (first 8 bytes of instruction data)
/// Calculated as: SHA-256("global:<instruction_name>")[0..8]
#[allow(non_snake_case)]
pub mod DISCRIMINATORS {
    /// SHA-256("global:ghostx_mint")[0..8]
    pub const MINT: [u8; 8] = [254, 237, 82, 195, 9, 61, 205, 242];

    /// SHA-256("global:ghostx_upgrade")[0..8]
    pub const UPGRADE: [u8; 8] = [0, 81, 111, 130, 32, 99, 161, 233];

    /// SHA-256("global:ghostx_claim")[0..8]
    pub const CLAIM: [u8; 8] = [59, 77, 100, 72, 250, 32, 154, 205];
}

/// Account discriminators (first 8 bytes of account data)
#[allow(non_snake_case)]
pub mod ACCOUNT_DISCRIMINATORS {
    /// SHA-256("account:GhostUserSummary")[0..8]
    pub const USER_SUMMARY: [u8; 8] = [40, 104, 12, 80, 73, 186, 121, 228];

    /// SHA-256("account:GhostSystemState")[0..8]
    pub const SYSTEM_STATE: [u8; 8] = [142, 223, 113, 238, 151, 193, 156, 92];
}

/// Event discriminators (first 8 bytes of `Program data:` payloads)
#[allow(non_snake_case)]
pub mod EVENT_DISCRIMINATORS {
    /// SHA-256("event:GhostClaimEvent")[0..8]
    pub const CLAIM: [u8; 8] = [82, 68, 89, 136, 12, 41, 159, 152];
}

/// Addresses of the Ghost program and token
///
/// Defaults to the mainnet deployment; config can point it elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostProgram {
    pub program_id: Pubkey,
    pub mint: Pubkey,
}

impl Default for GhostProgram {
    fn default() -> Self {
        Self {
            program_id: *GHOST_PROGRAM_ID,
            mint: *GHOST_MINT,
        }
    }
}

impl GhostProgram {
    pub fn new(program_id: Pubkey, mint: Pubkey) -> Self {
        Self { program_id, mint }
    }

    /// Derive the wallet-scoped summary PDA
    pub fn user_summary(&self, wallet: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[SEEDS::USER_SUMMARY, wallet.as_ref()], &self.program_id).0
    }

    /// Derive the system state PDA
    pub fn system_state(&self) -> Pubkey {
        Pubkey::find_program_address(&[SEEDS::SYSTEM_STATE], &self.program_id).0
    }

    /// Derive the mint authority PDA
    pub fn mint_authority(&self) -> Pubkey {
        Pubkey::find_program_address(&[SEEDS::MINT_AUTHORITY], &self.program_id).0
    }

    /// Derive the stake vault PDA
    pub fn stake_vault(&self) -> Pubkey {
        Pubkey::find_program_address(&[SEEDS::STAKE_VAULT], &self.program_id).0
    }

    /// Derive the wallet's associated token account for the GHOST mint
    pub fn holding_account(&self, wallet: &Pubkey) -> Pubkey {
        spl_associated_token_account::get_associated_token_address(wallet, &self.mint)
    }
}

/// Calculate an Anchor discriminator for `<namespace>:<name>`
pub fn calculate_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};

    let preimage = format!("{}:{}", namespace, name);
    let hash = Sha256::digest(preimage.as_bytes());

    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}
