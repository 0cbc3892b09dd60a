//! Wallet module
//!
//! Fleet wallets come from a local key file of base58 secret keys.
//! Each wallet's keypair is only ever used inside that wallet's own cycle.
//!
//! # Security
//!
//! The key file holds raw private keys. Keep it `chmod 600` and out of
//! version control; a warning is logged when it is readable by others.

pub mod keys;

pub use keys::{
    insecure_permissions, load_private_keys, load_wallets, parse_key_lines, KeyFile, KeyLine,
    Wallet, WalletSource,
};
