//! Low-level secp256k1 primitives: scalar/point arithmetic, SEC1 encoding,
//! and ECDSA, all delegated to the `secp256k1` crate's bindings to
//! libsecp256k1. This module states the contracts the rest of the crate
//! relies on; it does not reimplement curve arithmetic.

use secp256k1::{ecdsa, Message, PublicKey, Scalar, Secp256k1, SecretKey};

use crate::error::{Error, Result};

/// An ECDSA signature as the raw `(r, s)` scalar pair, each 32 bytes
/// big-endian, per spec: DER/compact wire encoding is out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    fn from_secp(sig: &ecdsa::Signature) -> Self {
        let compact = sig.serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Self { r, s }
    }

    fn to_secp(self) -> Result<ecdsa::Signature> {
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        ecdsa::Signature::from_compact(&compact)
            .map_err(|e| Error::ArgumentError(format!("invalid signature: {e}")))
    }
}

/// Computes `k * G` and returns its SEC1 encoding (33 bytes compressed,
/// 65 bytes uncompressed). Fails with [`Error::InvalidScalar`] if `k == 0`
/// or `k >= n`.
pub fn pubkey_from_privkey(privkey: &[u8; 32], compressed: bool) -> Result<Vec<u8>> {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(privkey).map_err(|_| Error::InvalidScalar)?;
    let pk = PublicKey::from_secret_key(&secp, &sk);
    Ok(if compressed {
        pk.serialize().to_vec()
    } else {
        pk.serialize_uncompressed().to_vec()
    })
}

/// Reports whether a SEC1-encoded public key is compressed (33 bytes,
/// `0x02`/`0x03` prefix) or uncompressed (65 bytes, `0x04` prefix).
/// Fails with [`Error::InvalidPubkey`] for any other shape.
pub fn is_compressed(pubkey: &[u8]) -> Result<bool> {
    match (pubkey.len(), pubkey.first()) {
        (33, Some(0x02) | Some(0x03)) => Ok(true),
        (65, Some(0x04)) => Ok(false),
        _ => Err(Error::InvalidPubkey(format!(
            "expected a 33-byte compressed or 65-byte uncompressed SEC1 key, got {} bytes",
            pubkey.len()
        ))),
    }
}

/// Converts any valid SEC1 public key to its 33-byte compressed form.
///
/// Compression needs only the encoded point's own bytes: the compressed
/// prefix is fully determined by the parity of the y-coordinate, so an
/// already-uncompressed key can be compressed without touching the
/// private key or doing further curve arithmetic.
pub fn compress_pubkey(pubkey: &[u8]) -> Result<[u8; 33]> {
    match pubkey.len() {
        33 => {
            is_compressed(pubkey)?;
            let mut out = [0u8; 33];
            out.copy_from_slice(pubkey);
            Ok(out)
        }
        65 => {
            is_compressed(pubkey)?;
            let y_last = pubkey[64];
            let prefix = if y_last % 2 == 0 { 0x02 } else { 0x03 };
            let mut out = [0u8; 33];
            out[0] = prefix;
            out[1..].copy_from_slice(&pubkey[1..33]);
            Ok(out)
        }
        _ => Err(Error::InvalidPubkey(format!(
            "expected a 33-byte compressed or 65-byte uncompressed SEC1 key, got {} bytes",
            pubkey.len()
        ))),
    }
}

/// Adds `tweak * G` to the point encoded by `pubkey` and returns the SEC1
/// compressed encoding of the sum.
///
/// Fails with [`Error::InvalidScalar`] if `tweak >= n`, or
/// [`Error::PointAtInfinity`] if the sum is the curve's identity element —
/// both of which are the conditions [`crate::hdnode::HDNode::derive`] uses
/// to decide whether to retry with the next index.
pub fn combine_pubkeys(tweak: &[u8; 32], pubkey: &[u8]) -> Result<[u8; 33]> {
    let secp = Secp256k1::new();
    let parent = PublicKey::from_slice(pubkey)
        .map_err(|e| Error::InvalidPubkey(format!("invalid parent public key: {e}")))?;
    let scalar = Scalar::from_be_bytes(*tweak).map_err(|_| Error::InvalidScalar)?;
    let child = parent
        .add_exp_tweak(&secp, &scalar)
        .map_err(|_| Error::PointAtInfinity)?;
    Ok(child.serialize())
}

/// Computes `(base + tweak) mod n` as a private scalar.
///
/// Fails with [`Error::InvalidScalar`] if `tweak >= n` or if the sum is `0`
/// — both conditions that trigger the BIP32 CKD retry rule.
pub fn add_scalars(base: &[u8; 32], tweak: &[u8; 32]) -> Result<[u8; 32]> {
    let sk = SecretKey::from_slice(base).map_err(|_| Error::InvalidScalar)?;
    let scalar = Scalar::from_be_bytes(*tweak).map_err(|_| Error::InvalidScalar)?;
    let child = sk.add_tweak(&scalar).map_err(|_| Error::InvalidScalar)?;
    Ok(child.secret_bytes())
}

/// Signs a 32-byte digest with a private scalar using deterministic
/// (RFC 6979) nonce generation, as the `secp256k1` crate always does for
/// `sign_ecdsa`.
pub fn ecdsa_sign(privkey: &[u8; 32], digest: &[u8; 32]) -> Result<Signature> {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(privkey).map_err(|_| Error::InvalidScalar)?;
    let msg = Message::from_digest_slice(digest)
        .map_err(|e| Error::ArgumentError(format!("invalid digest: {e}")))?;
    let sig = secp.sign_ecdsa(&msg, &sk);
    Ok(Signature::from_secp(&sig))
}

/// Verifies an ECDSA signature over a 32-byte digest against a SEC1 public key.
pub fn ecdsa_verify(pubkey: &[u8], digest: &[u8; 32], sig: &Signature) -> Result<bool> {
    let secp = Secp256k1::new();
    let pk = PublicKey::from_slice(pubkey)
        .map_err(|e| Error::InvalidPubkey(format!("invalid public key: {e}")))?;
    let msg = Message::from_digest_slice(digest)
        .map_err(|e| Error::ArgumentError(format!("invalid digest: {e}")))?;
    let secp_sig = sig.to_secp()?;
    Ok(secp.verify_ecdsa(&msg, &secp_sig, &pk).is_ok())
}
