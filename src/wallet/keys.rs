//! Key-file loading
//!
//! The wallet list is a plain text file with one base58-encoded 64-byte
//! secret key per line. Blank lines and lines starting with `#` are ignored.
//! The file is re-read every round so wallets can be added or removed
//! without a restart.

use std::fmt;
use std::path::{Path, PathBuf};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// A fleet wallet and its signing key
pub struct Wallet {
    /// Position in the key file (0-based, comments excluded)
    pub index: usize,
    keypair: Keypair,
}

impl Wallet {
    /// Decode a base58 secret key
    pub fn from_base58(index: usize, encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| Error::InvalidKeypair(format!("not base58: {}", e)))?;

        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| Error::InvalidKeypair(format!("not a valid keypair: {}", e)))?;

        Ok(Self { index, keypair })
    }

    pub fn from_keypair(index: usize, keypair: Keypair) -> Self {
        Self { index, keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Address prefix used in log lines
    pub fn short_address(&self) -> String {
        let address = self.pubkey().to_string();
        address.chars().take(8).collect()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("index", &self.index)
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

/// Where the fleet loop gets its wallets each round
pub trait WalletSource: Send + Sync {
    fn load(&self) -> Vec<Wallet>;

    /// Human-readable origin for log lines
    fn describe(&self) -> String;
}

/// Wallet list backed by a key file
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WalletSource for KeyFile {
    fn load(&self) -> Vec<Wallet> {
        warn_if_insecure(&self.path);
        load_wallets(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A key as it appears in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    /// 1-based line number in the file
    pub line_number: usize,
    pub key: String,
}

/// Non-empty, non-comment lines, trimmed
pub fn parse_key_lines(content: &str) -> Vec<KeyLine> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_number, key)| KeyLine {
            line_number,
            key: key.to_string(),
        })
        .collect()
}

/// Read the key lines from a file; an unreadable file yields no keys
pub fn load_private_keys(path: &Path) -> Vec<KeyLine> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_key_lines(&content),
        Err(e) => {
            error!("Failed to read key file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Decode every key in the file, skipping (and logging) malformed lines
pub fn load_wallets(path: &Path) -> Vec<Wallet> {
    let wallets: Vec<Wallet> = load_private_keys(path)
        .iter()
        .enumerate()
        .filter_map(|(index, line)| match Wallet::from_base58(index, &line.key) {
            Ok(wallet) => Some(wallet),
            Err(e) => {
                warn!(
                    "Skipping key on line {} of {}: {}",
                    line.line_number,
                    path.display(),
                    e
                );
                None
            }
        })
        .collect();

    debug!("Loaded {} wallets from {}", wallets.len(), path.display());
    wallets
}

/// Permission bits of a key file readable by group or others, if any
pub fn insecure_permissions(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path).ok()?.permissions().mode();
        if mode & 0o077 != 0 {
            return Some(mode & 0o777);
        }
        None
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

fn warn_if_insecure(path: &Path) {
    if let Some(mode) = insecure_permissions(path) {
        warn!(
            "Key file {} has insecure permissions {:o}. Run 'chmod 600 {}'",
            path.display(),
            mode,
            path.display()
        );
    }
}
