//! Configuration loading and validation
//!
//! Every value has a compiled-in default, so the cycler runs with no config
//! file at all. A TOML file and `GHOST__SECTION__KEY` environment variables
//! can override them.

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::ghost::program::{GHOST_DECIMALS, GHOST_MINT_STR, GHOST_PROGRAM_ID_STR};
use crate::ghost::GhostProgram;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub claim: ClaimConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    /// processed | confirmed | finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            commitment: default_commitment(),
            timeout_ms: default_timeout_ms(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
        }
    }
}

impl RpcConfig {
    pub fn commitment_config(&self) -> crate::error::Result<CommitmentConfig> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(crate::error::Error::Config(format!(
                "Unknown commitment level: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramConfig {
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default = "default_ghost_mint")]
    pub ghost_mint: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            ghost_mint: default_ghost_mint(),
            token_decimals: default_token_decimals(),
        }
    }
}

impl ProgramConfig {
    pub fn ghost_program(&self) -> crate::error::Result<GhostProgram> {
        let program_id = Pubkey::from_str(&self.program_id).map_err(|e| {
            crate::error::Error::Config(format!("Invalid program_id {}: {}", self.program_id, e))
        })?;
        let mint = Pubkey::from_str(&self.ghost_mint).map_err(|e| {
            crate::error::Error::Config(format!("Invalid ghost_mint {}: {}", self.ghost_mint, e))
        })?;
        Ok(GhostProgram::new(program_id, mint))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Compute unit price attached to every transaction
    #[serde(default = "default_priority_fee")]
    pub priority_fee_micro_lamports: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            priority_fee_micro_lamports: default_priority_fee(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Rent-exempt minimum for a token account
    #[serde(default = "default_account_rent")]
    pub account_rent_lamports: u64,
    #[serde(default = "default_estimated_fee")]
    pub estimated_fee_lamports: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            account_rent_lamports: default_account_rent(),
            estimated_fee_lamports: default_estimated_fee(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    /// Newline-delimited base58 private keys, re-read every round
    #[serde(default = "default_keys_file")]
    pub keys_file: String,
    #[serde(default = "default_wallet_delay_ms")]
    pub wallet_delay_ms: u64,
    #[serde(default = "default_round_delay_ms")]
    pub round_delay_ms: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            keys_file: default_keys_file(),
            wallet_delay_ms: default_wallet_delay_ms(),
            round_delay_ms: default_round_delay_ms(),
        }
    }
}

impl FleetConfig {
    pub fn wallet_delay(&self) -> Duration {
        Duration::from_millis(self.wallet_delay_ms)
    }

    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimConfig {
    /// Claim rewards while a wallet has nothing else to do
    #[serde(default = "default_true")]
    pub auto_claim: bool,
    /// Smallest estimate (base units) worth a claim transaction
    #[serde(default = "default_min_claim_amount")]
    pub min_claim_amount: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            auto_claim: true,
            min_claim_amount: default_min_claim_amount(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_commitment() -> String {
    "processed".to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_confirm_timeout_ms() -> u64 {
    60000
}

fn default_program_id() -> String {
    GHOST_PROGRAM_ID_STR.to_string()
}

fn default_ghost_mint() -> String {
    GHOST_MINT_STR.to_string()
}

fn default_token_decimals() -> u8 {
    GHOST_DECIMALS
}

fn default_priority_fee() -> u64 {
    38518
}

fn default_account_rent() -> u64 {
    2039280
}

fn default_estimated_fee() -> u64 {
    5000
}

fn default_keys_file() -> String {
    "ghost_keys.txt".to_string()
}

fn default_wallet_delay_ms() -> u64 {
    5000
}

fn default_round_delay_ms() -> u64 {
    30000
}

fn default_min_claim_amount() -> u64 {
    // 0.1 GHOST
    10_000_000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix GHOST_)
            .add_source(
                config::Environment::with_prefix("GHOST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.rpc
            .commitment_config()
            .context("Invalid rpc.commitment")?;

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        self.program
            .ghost_program()
            .context("Invalid program addresses")?;

        // 10^decimals must fit in a u64
        if self.program.token_decimals > 19 {
            anyhow::bail!(
                "program.token_decimals {} is out of range (max 19)",
                self.program.token_decimals
            );
        }

        // Anything above ~1 SOL per 200k CU is a typo
        if self.fees.priority_fee_micro_lamports > 5_000_000 {
            anyhow::bail!(
                "priority_fee_micro_lamports {} is unreasonably high",
                self.fees.priority_fee_micro_lamports
            );
        }

        if self.gas.estimated_fee_lamports == 0 {
            anyhow::bail!("estimated_fee_lamports must be positive");
        }

        if self.fleet.keys_file.trim().is_empty() {
            anyhow::bail!("fleet.keys_file must not be empty");
        }

        if self.fleet.round_delay_ms == 0 {
            tracing::warn!("fleet.round_delay_ms is 0 - rounds will hammer the RPC endpoint");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    commitment: {}
    timeout: {}ms
    confirm_timeout: {}ms
  Program:
    program_id: {}
    ghost_mint: {}
  Fees:
    priority_fee: {} micro-lamports/CU
  Gas floor:
    account_rent: {} lamports
    estimated_fee: {} lamports
  Fleet:
    keys_file: {}
    wallet_delay: {}ms
    round_delay: {}ms
  Claim:
    auto_claim: {}
    min_claim_amount: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.commitment,
            self.rpc.timeout_ms,
            self.rpc.confirm_timeout_ms,
            self.program.program_id,
            self.program.ghost_mint,
            self.fees.priority_fee_micro_lamports,
            self.gas.account_rent_lamports,
            self.gas.estimated_fee_lamports,
            self.fleet.keys_file,
            self.fleet.wallet_delay_ms,
            self.fleet.round_delay_ms,
            self.claim.auto_claim,
            self.claim.min_claim_amount,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
