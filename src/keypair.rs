//! Elliptic-curve key pairs: private scalar and/or SEC1 public key, WIF
//! import/export, P2PKH addressing, and ECDSA sign/verify.

use zeroize::Zeroizing;

use crate::base58check;
use crate::ecc::{self, Signature};
use crate::error::{Error, Result};
use crate::hash::hash160;
use crate::network::{self, Network};

/// An elliptic-curve key pair on secp256k1.
///
/// Exactly one of the private or public key is supplied at construction;
/// the public key is always materialized eagerly, so `pubkey_bytes()` never
/// needs to touch the private scalar after construction.
#[derive(Clone)]
pub struct KeyPair {
    privkey: Option<Zeroizing<[u8; 32]>>,
    pubkey: Vec<u8>,
    compressed: bool,
    network: Network,
}

impl KeyPair {
    /// Builds a key pair from a raw 32-byte big-endian private scalar.
    ///
    /// `compressed` controls which SEC1 form the derived public key takes
    /// (defaults effectively to `true` when callers don't care — see
    /// [`Self::from_private_key_hex`]).
    pub fn from_private_key_bytes(
        privkey: [u8; 32],
        compressed: bool,
        network: Network,
    ) -> Result<Self> {
        let pubkey = ecc::pubkey_from_privkey(&privkey, compressed)?;
        Ok(Self {
            privkey: Some(Zeroizing::new(privkey)),
            pubkey,
            compressed,
            network,
        })
    }

    /// Builds a key pair from a 64-character hex-encoded private scalar.
    pub fn from_private_key_hex(hex_str: &str, compressed: bool, network: Network) -> Result<Self> {
        if hex_str.len() != 64 {
            return Err(Error::ArgumentError(format!(
                "expected a 64-character hex private key, got {} characters",
                hex_str.len()
            )));
        }
        let mut privkey = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut privkey)
            .map_err(|e| Error::ArgumentError(format!("invalid hex private key: {e}")))?;
        Self::from_private_key_bytes(privkey, compressed, network)
    }

    /// Builds a neutered (public-only) key pair from SEC1-encoded bytes.
    ///
    /// The compression flag is inferred from the SEC1 prefix, never taken
    /// from a caller-supplied argument.
    pub fn from_public_key_bytes(pubkey: Vec<u8>, network: Network) -> Result<Self> {
        let compressed = ecc::is_compressed(&pubkey)?;
        Ok(Self {
            privkey: None,
            pubkey,
            compressed,
            network,
        })
    }

    /// The private key, if present, as a 32-byte big-endian scalar.
    pub fn privkey_bytes(&self) -> Option<&[u8; 32]> {
        self.privkey.as_deref()
    }

    /// The SEC1-encoded public key, at this key pair's declared compression.
    pub fn pubkey_bytes(&self) -> &[u8] {
        &self.pubkey
    }

    /// The SEC1 public key, always in 33-byte compressed form.
    ///
    /// HD fingerprinting and child key derivation both require the
    /// compressed encoding regardless of a node's own preference; this
    /// accessor supplies it without any private-key arithmetic.
    pub fn pubkey_bytes_compressed(&self) -> Result<[u8; 33]> {
        ecc::compress_pubkey(&self.pubkey)
    }

    /// Whether the public key is SEC1-compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// `true` if this key pair holds no private key.
    pub fn is_neutered(&self) -> bool {
        self.privkey.is_none()
    }

    /// The network this key pair is associated with.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Imports a private key from Wallet Import Format.
    pub fn from_wif(wif: &str) -> Result<Self> {
        let buffer = base58check::decode(wif)?;
        let compressed = match buffer.len() {
            33 => false,
            34 => {
                if buffer[33] != 0x01 {
                    return Err(Error::InvalidEncoding(
                        "WIF compression flag byte must be 0x01".into(),
                    ));
                }
                true
            }
            n => {
                return Err(Error::InvalidEncoding(format!(
                    "expected a 33- or 34-byte WIF payload, got {n} bytes"
                )))
            }
        };

        let network = network::find_by_wif(buffer[0])?;
        let mut privkey = [0u8; 32];
        privkey.copy_from_slice(&buffer[1..33]);
        Self::from_private_key_bytes(privkey, compressed, network)
    }

    /// Exports the private key as Wallet Import Format.
    ///
    /// Fails with [`Error::NoPrivateKey`] if this key pair is neutered.
    pub fn to_wif(&self) -> Result<String> {
        let privkey = self.privkey_bytes().ok_or(Error::NoPrivateKey)?;
        let mut buffer = Vec::with_capacity(34);
        buffer.push(self.network.wif);
        buffer.extend_from_slice(privkey);
        if self.compressed {
            buffer.push(0x01);
        }
        Ok(base58check::encode(&buffer))
    }

    /// Computes the P2PKH address for this key pair's public key.
    ///
    /// The address depends on the exact SEC1 bytes in use, so a compressed
    /// and uncompressed public key derived from the same private key yield
    /// different addresses.
    pub fn get_address(&self) -> String {
        let mut buffer = Vec::with_capacity(21);
        buffer.push(self.network.pub_key_hash);
        buffer.extend_from_slice(&hash160(&self.pubkey));
        base58check::encode(&buffer)
    }

    /// Signs a 32-byte digest. Requires a private key.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Signature> {
        let privkey = self.privkey_bytes().ok_or(Error::NoPrivateKey)?;
        ecc::ecdsa_sign(privkey, digest)
    }

    /// Verifies a signature over a 32-byte digest against this key pair's
    /// public key.
    pub fn verify(&self, digest: &[u8; 32], sig: &Signature) -> Result<bool> {
        ecc::ecdsa_verify(&self.pubkey, digest, sig)
    }

    /// Prints the private key in the clear for debug tooling. Never call
    /// this outside of a debugger or local diagnostics.
    #[cfg(debug_assertions)]
    pub fn debug_dump_insecure(&self) -> String {
        format!(
            "KeyPair(privkey={}, pubkey={}, compressed={}, network={})",
            self.privkey
                .as_ref()
                .map(|k| hex::encode(k.as_slice()))
                .unwrap_or_else(|| "None".to_string()),
            hex::encode(&self.pubkey),
            self.compressed,
            self.network.description,
        )
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.privkey.as_deref() == other.privkey.as_deref()
            && self.pubkey == other.pubkey
            && self.compressed == other.compressed
            && self.network == other.network
    }
}

impl Eq for KeyPair {}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("privkey", &self.privkey.as_ref().map(|_| "<redacted>"))
            .field("pubkey", &hex::encode(&self.pubkey))
            .field("compressed", &self.compressed)
            .field("network", &self.network.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::BITCOIN_MAINNET;

    #[test]
    fn private_key_only_defaults_to_compressed() {
        let kp = KeyPair::from_private_key_bytes([0x01; 32], true, BITCOIN_MAINNET).unwrap();
        assert!(kp.is_compressed());
        assert_eq!(kp.pubkey_bytes().len(), 33);
    }

    #[test]
    fn public_key_construction_infers_compression_from_prefix() {
        let kp = KeyPair::from_private_key_bytes([0x02; 32], false, BITCOIN_MAINNET).unwrap();
        let pub_only =
            KeyPair::from_public_key_bytes(kp.pubkey_bytes().to_vec(), BITCOIN_MAINNET).unwrap();
        assert!(!pub_only.is_compressed());
        assert!(pub_only.is_neutered());
    }

    #[test]
    fn wif_round_trip_preserves_privkey_and_compression() {
        let kp = KeyPair::from_private_key_bytes([0x42; 32], true, BITCOIN_MAINNET).unwrap();
        let wif = kp.to_wif().unwrap();
        let recovered = KeyPair::from_wif(&wif).unwrap();
        assert_eq!(recovered.privkey_bytes(), kp.privkey_bytes());
        assert_eq!(recovered.is_compressed(), kp.is_compressed());
    }

    #[test]
    fn known_wif_vectors_round_trip() {
        let privkey_hex = "ba8c65b5e47143979b3506a742b4bd95c1ddb419195915c3679e38e9bffbeb45";
        let compressed_wif = "L3ULUjNr4gfjcxFEJVo6bETbDvY6Z3wwU5oribqt692o9a5SHV2R";
        let uncompressed_wif = "5KESiB48wksvA4141nwrJGjjC5szu81fd3T2J8SaKqVW2zmxdCr";

        let compressed_kp = KeyPair::from_private_key_hex(privkey_hex, true, BITCOIN_MAINNET)
            .unwrap();
        assert_eq!(compressed_kp.to_wif().unwrap(), compressed_wif);

        let uncompressed_kp = KeyPair::from_private_key_hex(privkey_hex, false, BITCOIN_MAINNET)
            .unwrap();
        assert_eq!(uncompressed_kp.to_wif().unwrap(), uncompressed_wif);
    }

    #[test]
    fn neutered_keypair_cannot_export_wif_or_sign() {
        let kp = KeyPair::from_private_key_bytes([0x09; 32], true, BITCOIN_MAINNET).unwrap();
        let pub_only =
            KeyPair::from_public_key_bytes(kp.pubkey_bytes().to_vec(), BITCOIN_MAINNET).unwrap();
        assert!(matches!(pub_only.to_wif(), Err(Error::NoPrivateKey)));
        assert!(matches!(
            pub_only.sign(&[0u8; 32]),
            Err(Error::NoPrivateKey)
        ));
    }

    #[test]
    fn compressed_and_uncompressed_pubkeys_yield_different_addresses() {
        let compressed = KeyPair::from_private_key_bytes([0x05; 32], true, BITCOIN_MAINNET)
            .unwrap();
        let uncompressed = KeyPair::from_private_key_bytes([0x05; 32], false, BITCOIN_MAINNET)
            .unwrap();
        assert_ne!(compressed.get_address(), uncompressed.get_address());
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let kp = KeyPair::from_private_key_bytes([0x11; 32], true, BITCOIN_MAINNET).unwrap();
        let digest = crate::hash::sha256(b"message");
        let sig = kp.sign(&digest).unwrap();
        assert!(kp.verify(&digest, &sig).unwrap());
    }
}
