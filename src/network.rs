//! Named network parameter sets and the process-wide network registry.

use std::sync::{OnceLock, RwLock};

use crate::error::{Error, Result};

/// An immutable set of version/prefix bytes identifying a cryptocurrency
/// network's extended-key, address, and WIF framing.
///
/// Equality is by every field (including `description`), so two
/// differently-described but otherwise byte-identical networks compare
/// unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    /// Human-readable label, e.g. `"Bitcoin Mainnet"`.
    pub description: &'static str,
    /// Version bytes for `xprv`/`tprv`-style extended private keys.
    pub version_priv: u32,
    /// Version bytes for `xpub`/`tpub`-style extended public keys.
    pub version_pub: u32,
    /// P2PKH address version byte.
    pub pub_key_hash: u8,
    /// WIF version byte.
    pub wif: u8,
}

/// Bitcoin mainnet: `xprv`/`xpub`, P2PKH prefix `0x00`, WIF prefix `0x80`.
pub const BITCOIN_MAINNET: Network = Network {
    description: "Bitcoin Mainnet",
    version_priv: 0x0488_ADE4,
    version_pub: 0x0488_B21E,
    pub_key_hash: 0x00,
    wif: 0x80,
};

/// Bitcoin testnet: `tprv`/`tpub`, P2PKH prefix `0x6F`, WIF prefix `0xEF`.
pub const BITCOIN_TESTNET: Network = Network {
    description: "Bitcoin Testnet",
    version_priv: 0x0435_8394,
    version_pub: 0x0435_87CF,
    pub_key_hash: 0x6F,
    wif: 0xEF,
};

static REGISTRY: OnceLock<RwLock<Vec<Network>>> = OnceLock::new();

fn registry() -> &'static RwLock<Vec<Network>> {
    REGISTRY.get_or_init(|| RwLock::new(vec![BITCOIN_MAINNET, BITCOIN_TESTNET]))
}

/// Returns the currently supported networks.
///
/// Readers never mutate the registry; concurrent reads are always safe.
pub fn supported_networks() -> Vec<Network> {
    registry()
        .read()
        .expect("network registry lock poisoned")
        .clone()
}

/// Replaces the list of supported networks.
///
/// This should only be called at process startup: writes are not meant to
/// race with readers that are actively deriving or serializing keys.
pub fn set_supported_networks(networks: Vec<Network>) {
    *registry().write().expect("network registry lock poisoned") = networks;
}

/// Finds the registered network whose `version_priv` or `version_pub`
/// equals `version`.
pub fn find_by_version(version: u32) -> Result<Network> {
    supported_networks()
        .into_iter()
        .find(|n| n.version_priv == version || n.version_pub == version)
        .ok_or(Error::UnsupportedNetwork)
}

/// Finds the registered network whose `wif` byte equals `wif`.
pub fn find_by_wif(wif: u8) -> Result<Network> {
    supported_networks()
        .into_iter()
        .find(|n| n.wif == wif)
        .ok_or(Error::UnsupportedNetwork)
}
