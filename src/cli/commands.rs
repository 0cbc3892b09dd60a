//! CLI command implementations

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fleet::{FleetLoop, FleetTiming, WalletCycleRunner};
use crate::ledger::RpcLedger;
use crate::progression::TierTable;
use crate::wallet::{insecure_permissions, KeyFile, WalletSource};

/// Build the runner shared by `run` and `status`
fn build_runner(config: &Config) -> Result<WalletCycleRunner<RpcLedger>> {
    let ledger = Arc::new(RpcLedger::new(&config.rpc).context("Failed to initialize RPC client")?);
    let program = config
        .program
        .ghost_program()
        .context("Invalid program configuration")?;
    let tiers = Arc::new(TierTable::published());

    Ok(WalletCycleRunner::new(ledger, program, tiers, config))
}

/// Perform startup checks before the fleet loop
///
/// Only configuration defects fail here. A missing or empty key file is
/// reported by the loop's first load.
pub fn startup_checks(config: &Config) -> Result<()> {
    info!("Performing startup checks...");

    let keys_path = std::path::Path::new(&config.fleet.keys_file);
    if !keys_path.exists() {
        warn!("Key file not found: {}", keys_path.display());
    } else if let Some(mode) = insecure_permissions(keys_path) {
        warn!(
            "Key file {} has insecure permissions {:o}. Run 'chmod 600 {}' to fix.",
            keys_path.display(),
            mode,
            keys_path.display()
        );
    } else {
        info!("Key file permissions OK");
    }

    if config.claim.auto_claim {
        info!(
            "Auto-claim on: claims of at least {} base units while idle",
            config.claim.min_claim_amount
        );
    }

    warn!(
        "Gas floor active: mint needs {} lamports, upgrade/claim {} lamports",
        config
            .gas
            .account_rent_lamports
            .saturating_add(config.gas.estimated_fee_lamports),
        config.gas.estimated_fee_lamports
    );

    info!("Startup checks passed");
    Ok(())
}

/// Run the mint / upgrade / claim loop until stopped
pub async fn run(config: &Config) -> Result<()> {
    info!("Starting ghost cycler...");
    info!(
        "Priority fee: {} micro-lamports/CU, wallet delay: {}ms, round delay: {}ms",
        config.fees.priority_fee_micro_lamports,
        config.fleet.wallet_delay_ms,
        config.fleet.round_delay_ms
    );
    if !config.claim.auto_claim {
        info!("Auto-claim disabled");
    }

    let runner = build_runner(config)?;
    let keys = KeyFile::new(&config.fleet.keys_file);
    info!("Wallet list: {}", keys.describe());

    let mut fleet = FleetLoop::new(runner, keys, FleetTiming::from(&config.fleet));
    fleet.run().await.context("Fleet loop stopped")?;

    Ok(())
}

/// One read-only pass over every wallet; sends nothing
pub async fn status(config: &Config) -> Result<()> {
    let runner = build_runner(config)?;
    let keys = KeyFile::new(&config.fleet.keys_file);

    let wallets = keys.load();
    if wallets.is_empty() {
        anyhow::bail!("No valid private keys found in {}", keys.describe());
    }

    println!("\n=== GHOST FLEET STATUS ===\n");
    println!("Mint: {}", config.program.ghost_mint);
    println!("Wallets: {}", wallets.len());

    let formatter = runner.formatter();
    let mut system_printed = false;
    let mut failures = 0;

    for wallet in &wallets {
        match runner.inspect(wallet).await {
            Ok(inspection) => {
                if !system_printed {
                    println!();
                    for line in formatter.system_lines(&inspection.snapshot.system) {
                        println!("{}", line);
                    }
                    system_printed = true;
                }

                println!("\n#{} {}", wallet.index + 1, wallet.pubkey());
                for line in formatter.wallet_lines(
                    &inspection.snapshot.wallet,
                    Some(inspection.sol_balance),
                    Utc::now(),
                ) {
                    println!("  {}", line);
                }
                println!("  Next action: {}", inspection.decision);
            }
            Err(e) => {
                failures += 1;
                error!("[{}] Status fetch failed: {}", wallet.short_address(), e);
                println!("\n#{} {}", wallet.index + 1, wallet.pubkey());
                println!("  (fetch failed: {})", e);
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{} of {} wallets could not be read", failures, wallets.len());
    }

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
