//! Crate-wide error type.

use thiserror::Error;

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Base58Check decoding failed: bad alphabet, bad length, or checksum mismatch.
    #[error("invalid base58check encoding: {0}")]
    InvalidEncoding(String),

    /// A private key scalar was zero or not less than the secp256k1 group order.
    #[error("invalid private key scalar")]
    InvalidScalar,

    /// A SEC1-encoded public key failed to decode, or the prefix/length was wrong.
    #[error("invalid SEC1 public key: {0}")]
    InvalidPubkey(String),

    /// Public-only child derivation produced the point at infinity.
    ///
    /// Only ever raised internally by [`crate::ecc::combine_pubkeys`]; callers of
    /// [`crate::hdnode::HDNode::derive`] never observe it, since it triggers the
    /// BIP32 retry rule instead of propagating.
    #[error("point at infinity")]
    PointAtInfinity,

    /// Hardened derivation was attempted from a neutered (public-only) node.
    #[error("cannot derive a hardened child from a neutered node")]
    CannotHardenNeutered,

    /// An operation that requires a private key (WIF export, signing) was
    /// attempted on a neutered key pair.
    #[error("key pair has no private key")]
    NoPrivateKey,

    /// No registered network matches the requested version bytes or WIF prefix.
    #[error("no registered network matches the given identifier")]
    UnsupportedNetwork,

    /// A constructor contract was violated (wrong byte lengths, conflicting
    /// arguments, malformed hex, etc).
    #[error("{0}")]
    ArgumentError(String),

    /// A derivation path string did not match `m(/uint32['Hh]?)*`.
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// The CKD retry rule rejected every candidate index in the bounded retry
    /// window. Astronomically unlikely (probability <= 2^-127 per step) but
    /// must still terminate rather than recurse forever.
    #[error("derivation exhausted {0} retries without producing a valid child key")]
    DerivationExhausted(u32),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
