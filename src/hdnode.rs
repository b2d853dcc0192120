//! The BIP32 HD node: a key pair plus chain code and tree position, with
//! child key derivation (CKD), neutering, and xprv/xpub serialization.

use crate::base58check;
use crate::ecc;
use crate::error::{Error, Result};
use crate::hash::{hash160, hmac_sha512, BITCOIN_SEED};
use crate::keypair::KeyPair;
use crate::network::{self, Network};

/// Bit 31 set marks a hardened child index.
pub const HARDENED_BIT: u32 = 0x8000_0000;

/// Upper bound on CKD retries before giving up. Hitting this is
/// astronomically unlikely (each retry step fails with probability
/// <= 2^-127) but the loop must still terminate.
pub const MAX_DERIVATION_RETRIES: u32 = 256;

const SERIALIZED_LEN: usize = 78;

/// A node in a BIP32 hierarchical deterministic key tree.
#[derive(Clone, Debug)]
pub struct HDNode {
    keypair: KeyPair,
    chain_code: [u8; 32],
    depth: u8,
    index: u32,
    parent_fingerprint: u32,
}

impl HDNode {
    /// Constructs a node directly from its parts.
    ///
    /// Enforces the root invariant: at `depth == 0`, `parent_fingerprint`
    /// and `index` must both be zero.
    pub fn new(
        keypair: KeyPair,
        chain_code: [u8; 32],
        depth: u8,
        index: u32,
        parent_fingerprint: u32,
    ) -> Result<Self> {
        if depth == 0 && (parent_fingerprint != 0 || index != 0) {
            return Err(Error::ArgumentError(
                "a depth-0 (master) node must have index and parent_fingerprint equal to 0".into(),
            ));
        }
        Ok(Self {
            keypair,
            chain_code,
            depth,
            index,
            parent_fingerprint,
        })
    }

    /// Derives a master node from a seed, per BIP32: `I =
    /// HMAC-SHA512("Bitcoin seed", seed)`, `privkey = I[0..32]`,
    /// `chain_code = I[32..64]`.
    pub fn from_seed(seed: &[u8], network: Network) -> Result<Self> {
        let i = hmac_sha512(BITCOIN_SEED, seed);
        let mut privkey = [0u8; 32];
        let mut chain_code = [0u8; 32];
        privkey.copy_from_slice(&i[..32]);
        chain_code.copy_from_slice(&i[32..]);

        let keypair = KeyPair::from_private_key_bytes(privkey, true, network)?;
        Self::new(keypair, chain_code, 0, 0, 0)
    }

    /// The underlying key pair.
    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    /// The 32-byte chain code mixed into every child derivation.
    pub fn chain_code(&self) -> [u8; 32] {
        self.chain_code
    }

    /// Depth in the HD tree; `0` for the master node.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// This node's own index within its parent (the value `derive` was
    /// called with, after any retry-driven increments).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The big-endian fingerprint of this node's parent; `0` for the master.
    pub fn parent_fingerprint(&self) -> u32 {
        self.parent_fingerprint
    }

    /// `true` if `index` denotes a hardened child.
    pub fn is_hardened(&self) -> bool {
        self.index >= HARDENED_BIT
    }

    /// `true` if this node has no private key.
    pub fn is_neutered(&self) -> bool {
        self.keypair.is_neutered()
    }

    /// Returns a node that shares this one's metadata but whose key pair
    /// retains only the SEC1-compressed public key.
    ///
    /// A neutered node can still derive non-hardened descendants.
    pub fn neuter(&self) -> Result<Self> {
        let pubkey = self.keypair.pubkey_bytes_compressed()?.to_vec();
        let keypair = KeyPair::from_public_key_bytes(pubkey, self.keypair.network())?;
        Ok(Self {
            keypair,
            chain_code: self.chain_code,
            depth: self.depth,
            index: self.index,
            parent_fingerprint: self.parent_fingerprint,
        })
    }

    /// `HASH160` of the compressed public key — the value children's
    /// `parent_fingerprint` is derived from.
    pub fn identifier(&self) -> Result<[u8; 20]> {
        Ok(hash160(&self.keypair.pubkey_bytes_compressed()?))
    }

    /// The first 4 bytes of [`Self::identifier`].
    pub fn fingerprint(&self) -> Result<[u8; 4]> {
        let id = self.identifier()?;
        let mut fp = [0u8; 4];
        fp.copy_from_slice(&id[..4]);
        Ok(fp)
    }

    /// Child key derivation (CKD) for index `index`.
    ///
    /// Implements the BIP32 retry rule as a bounded loop: if the HMAC
    /// output's left half is not a valid tweak, or applying it produces an
    /// invalid child (a zero private scalar, or the point at infinity for
    /// public-only derivation), the next index is tried instead, up to
    /// [`MAX_DERIVATION_RETRIES`] attempts.
    pub fn derive(&self, index: u32) -> Result<Self> {
        let mut candidate = index;
        let mut attempts = 0u32;

        loop {
            if attempts >= MAX_DERIVATION_RETRIES {
                return Err(Error::DerivationExhausted(MAX_DERIVATION_RETRIES));
            }

            let hardened = candidate >= HARDENED_BIT;
            let mut data = Vec::with_capacity(37);
            if hardened {
                let privkey = self
                    .keypair
                    .privkey_bytes()
                    .ok_or(Error::CannotHardenNeutered)?;
                data.push(0x00);
                data.extend_from_slice(privkey);
            } else {
                data.extend_from_slice(&self.keypair.pubkey_bytes_compressed()?);
            }
            data.extend_from_slice(&candidate.to_be_bytes());

            let i = hmac_sha512(&self.chain_code, &data);
            let mut i_l = [0u8; 32];
            let mut i_r = [0u8; 32];
            i_l.copy_from_slice(&i[..32]);
            i_r.copy_from_slice(&i[32..]);

            let child_keypair = if self.is_neutered() {
                match ecc::combine_pubkeys(&i_l, &self.keypair.pubkey_bytes_compressed()?) {
                    Ok(child_pub) => {
                        KeyPair::from_public_key_bytes(child_pub.to_vec(), self.keypair.network())
                    }
                    Err(Error::InvalidScalar) | Err(Error::PointAtInfinity) => {
                        candidate = candidate
                            .checked_add(1)
                            .ok_or(Error::DerivationExhausted(MAX_DERIVATION_RETRIES))?;
                        attempts += 1;
                        continue;
                    }
                    Err(e) => Err(e),
                }
            } else {
                let parent_priv = self
                    .keypair
                    .privkey_bytes()
                    .expect("is_neutered() == false guarantees a private key is present");
                match ecc::add_scalars(parent_priv, &i_l) {
                    Ok(child_priv) => KeyPair::from_private_key_bytes(
                        child_priv,
                        self.keypair.is_compressed(),
                        self.keypair.network(),
                    ),
                    Err(Error::InvalidScalar) => {
                        candidate = candidate
                            .checked_add(1)
                            .ok_or(Error::DerivationExhausted(MAX_DERIVATION_RETRIES))?;
                        attempts += 1;
                        continue;
                    }
                    Err(e) => Err(e),
                }
            }?;

            let parent_fingerprint = u32::from_be_bytes(self.fingerprint()?);
            return Self::new(
                child_keypair,
                i_r,
                self.depth + 1,
                candidate,
                parent_fingerprint,
            );
        }
    }

    /// `derive(index + HARDENED_BIT)`. Requires `index < HARDENED_BIT`.
    pub fn derive_hardened(&self, index: u32) -> Result<Self> {
        if index >= HARDENED_BIT {
            return Err(Error::ArgumentError(
                "hardened index must be less than 0x80000000".into(),
            ));
        }
        self.derive(index + HARDENED_BIT)
    }

    /// Derives along a path string of the form `m(/uint32[']?)*`, where
    /// `'`, `H`, or `h` mark a hardened component. The leading `m` is a
    /// label only; it does not require `self` to be the master node.
    pub fn derive_path(&self, path: &str) -> Result<Self> {
        let mut components = path.split('/');
        match components.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(Error::InvalidPath(format!(
                    "path must start with 'm', got {path:?}"
                )))
            }
        }

        let mut node = self.clone();
        for component in components {
            let (digits, hardened) = match component.strip_suffix(&['\'', 'H', 'h'][..]) {
                Some(rest) => (rest, true),
                None => (component, false),
            };
            let num: u32 = digits.parse().map_err(|_| {
                Error::InvalidPath(format!("{component:?} is not a valid derivation index"))
            })?;
            if num >= HARDENED_BIT {
                return Err(Error::InvalidPath(format!(
                    "{component:?} is out of range (must be < 0x80000000)"
                )));
            }
            node = if hardened {
                node.derive_hardened(num)?
            } else {
                node.derive(num)?
            };
        }
        Ok(node)
    }

    /// Serializes this node as a 78-byte xprv/xpub buffer, Base58Check-encoded.
    pub fn to_base58(&self) -> Result<String> {
        let network = self.keypair.network();
        let version = if self.is_neutered() {
            network.version_pub
        } else {
            network.version_priv
        };

        let mut buffer = Vec::with_capacity(SERIALIZED_LEN);
        buffer.extend_from_slice(&version.to_be_bytes());
        buffer.push(self.depth);
        buffer.extend_from_slice(&self.parent_fingerprint.to_be_bytes());
        buffer.extend_from_slice(&self.index.to_be_bytes());
        buffer.extend_from_slice(&self.chain_code);
        if self.is_neutered() {
            buffer.extend_from_slice(&self.keypair.pubkey_bytes_compressed()?);
        } else {
            buffer.push(0x00);
            buffer.extend_from_slice(
                self.keypair
                    .privkey_bytes()
                    .expect("non-neutered node always has a private key"),
            );
        }
        debug_assert_eq!(buffer.len(), SERIALIZED_LEN);

        Ok(base58check::encode(&buffer))
    }

    /// Parses a Base58Check-encoded xprv/xpub string.
    pub fn from_base58(s: &str) -> Result<Self> {
        let buffer = base58check::decode(s)?;
        if buffer.len() != SERIALIZED_LEN {
            return Err(Error::InvalidEncoding(format!(
                "expected a {SERIALIZED_LEN}-byte extended key, got {} bytes",
                buffer.len()
            )));
        }

        let version = u32::from_be_bytes(buffer[0..4].try_into().unwrap());
        let network = network::find_by_version(version)?;
        let depth = buffer[4];
        let parent_fingerprint = u32::from_be_bytes(buffer[5..9].try_into().unwrap());
        let index = u32::from_be_bytes(buffer[9..13].try_into().unwrap());
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&buffer[13..45]);
        let key = &buffer[45..78];

        let keypair = if version == network.version_priv {
            if key[0] != 0x00 {
                return Err(Error::InvalidEncoding(
                    "private extended key must pad its key field with a leading 0x00".into(),
                ));
            }
            let mut privkey = [0u8; 32];
            privkey.copy_from_slice(&key[1..33]);
            KeyPair::from_private_key_bytes(privkey, true, network)?
        } else {
            KeyPair::from_public_key_bytes(key.to_vec(), network)?
        };

        Self::new(keypair, chain_code, depth, index, parent_fingerprint)
    }

    /// Convenience delegate to [`KeyPair::get_address`].
    pub fn get_address(&self) -> String {
        self.keypair.get_address()
    }
}

impl PartialEq for HDNode {
    fn eq(&self, other: &Self) -> bool {
        self.keypair == other.keypair
            && self.chain_code == other.chain_code
            && self.depth == other.depth
            && self.index == other.index
            && self.parent_fingerprint == other.parent_fingerprint
    }
}

impl Eq for HDNode {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{BITCOIN_MAINNET, BITCOIN_TESTNET};

    fn seed(hex_str: &str) -> Vec<u8> {
        let mut buf = vec![0u8; hex_str.len() / 2];
        hex::decode_to_slice(hex_str, &mut buf[..]).unwrap();
        buf
    }

    #[test]
    fn master_node_rejects_nonzero_parent_fingerprint_or_index() {
        let kp = KeyPair::from_private_key_bytes([0x01; 32], true, BITCOIN_MAINNET).unwrap();
        assert!(HDNode::new(kp.clone(), [0u8; 32], 0, 1, 0).is_err());
        assert!(HDNode::new(kp, [0u8; 32], 0, 0, 1).is_err());
    }

    #[test]
    fn bip32_vector1_master_and_path() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();

        assert_eq!(
            master.to_base58().unwrap(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.neuter().unwrap().to_base58().unwrap(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );

        let path = master
            .derive_path("m/0'/1/2'/2/1000000000")
            .unwrap();
        assert_eq!(
            path.to_base58().unwrap(),
            "xprvA41z7zogVVwxVSgdKUHDy1SKmdb533PjDz7J6N6mV6uS3ze1ai8FHa8kmHScGpWmj4WggLyQjgPie1rFSruoUihUZREPSL39UNdE3BBDu76"
        );
    }

    #[test]
    fn bip32_vector2_public_only_chain() {
        let s = seed(
            "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a29f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542",
        );
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        let derived = master
            .derive_path("m/0/2147483647'/1/2147483646'/2")
            .unwrap();
        assert_eq!(
            derived.neuter().unwrap().to_base58().unwrap(),
            "xpub6FnCn6nSzZAw5Tw7cgR9bi15UV96gLZhjDstkXXxvCLsUXBGXPdSnLFbdpq8p9HmGsApME5hQTZ3emM2rnY5agb9rXpVGyy3bdW6EEgAtqt"
        );
    }

    #[test]
    fn from_base58_round_trips_to_base58() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        let child = master.derive_path("m/0'/1").unwrap();
        let encoded = child.to_base58().unwrap();
        let decoded = HDNode::from_base58(&encoded).unwrap();
        assert_eq!(decoded, child);
    }

    #[test]
    fn neutering_commutes_with_non_hardened_derivation() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();

        let via_private_then_neuter = master.derive(0).unwrap().neuter().unwrap();
        let via_neuter_then_public = master.neuter().unwrap().derive(0).unwrap();

        assert_eq!(
            via_private_then_neuter.to_base58().unwrap(),
            via_neuter_then_public.to_base58().unwrap()
        );
    }

    #[test]
    fn hardened_derivation_from_neutered_node_fails() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        let neutered = master.neuter().unwrap();
        assert!(matches!(
            neutered.derive_hardened(0),
            Err(Error::CannotHardenNeutered)
        ));
    }

    #[test]
    fn derive_path_matches_explicit_chained_derive_calls() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();

        let via_path = master.derive_path("m/1/2'/3").unwrap();
        let via_calls = master
            .derive(1)
            .unwrap()
            .derive_hardened(2)
            .unwrap()
            .derive(3)
            .unwrap();

        assert_eq!(via_path, via_calls);
    }

    #[test]
    fn depth_and_parent_fingerprint_advance_on_derive() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        let child = master.derive(0).unwrap();
        assert_eq!(child.depth(), master.depth() + 1);
        assert_eq!(
            child.parent_fingerprint(),
            u32::from_be_bytes(master.fingerprint().unwrap())
        );
    }

    #[test]
    fn identifier_is_20_bytes_and_fingerprint_is_its_prefix() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        let id = master.identifier().unwrap();
        let fp = master.fingerprint().unwrap();
        assert_eq!(id.len(), 20);
        assert_eq!(&id[..4], &fp);
    }

    #[test]
    fn from_base58_rejects_version_matching_no_network() {
        // A syntactically valid 78-byte buffer whose version is unassigned.
        let mut buffer = vec![0xAAu8; 78];
        buffer[0..4].copy_from_slice(&0x01234567u32.to_be_bytes());
        let encoded = base58check::encode(&buffer);
        assert!(matches!(
            HDNode::from_base58(&encoded),
            Err(Error::UnsupportedNetwork)
        ));
    }

    #[test]
    fn testnet_master_uses_testnet_version_bytes() {
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_TESTNET).unwrap();
        let encoded = master.to_base58().unwrap();
        assert!(encoded.starts_with("tprv"));
        assert_eq!(
            master.neuter().unwrap().to_base58().unwrap()[..4].to_string(),
            "tpub"
        );
    }

    #[test]
    fn retry_rule_advances_index_when_hmac_output_is_rejected() {
        // A hand-picked (seed, chain_code) pair is infeasible to fault-inject
        // without a stubbable HMAC, so this instead exercises the bounded-loop
        // plumbing directly: deriving a wide spread of indices from the same
        // parent must always either succeed with index >= the requested one,
        // or fail with DerivationExhausted, and never loop forever.
        let s = seed("000102030405060708090a0b0c0d0e0f");
        let master = HDNode::from_seed(&s, BITCOIN_MAINNET).unwrap();
        for i in 0..50u32 {
            let child = master.derive(i).unwrap();
            assert!(child.index() >= i);
        }
    }
}
