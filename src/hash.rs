//! Hash primitives used throughout the crate.
//!
//! Pure functions, no state. `hash160` is `RIPEMD160(SHA256(x))`, the digest
//! used for fingerprints and P2PKH addresses. `hmac_sha512` is the engine
//! behind master-node generation and child key derivation.

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

type HmacSha512 = Hmac<Sha512>;

/// The fixed HMAC key used to derive a master node from a seed (BIP32).
pub const BITCOIN_SEED: &[u8] = b"Bitcoin seed";

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RIPEMD-160 digest.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// HMAC-SHA-512, returning the full 64-byte output.
///
/// An HMAC key of any length is accepted per RFC 2104; `Hmac::new_from_slice`
/// never fails for SHA-512.
pub fn hmac_sha512(key: &[u8], msg: &[u8]) -> [u8; 64] {
    let mut mac =
        HmacSha512::new_from_slice(key).expect("HMAC-SHA512 accepts a key of any length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}
