//! Hierarchical Deterministic (HD) key trees for Bitcoin, per BIP32.
//!
//! From a master seed this crate deterministically derives an unbounded
//! tree of secp256k1 key pairs addressed by paths of 32-bit indices,
//! supporting both hardened derivation (needs the parent private key) and
//! normal derivation (possible from the parent public key alone). Extended
//! keys import/export in the standard Base58Check `xprv`/`xpub` framing;
//! key pairs export WIF and compute P2PKH addresses.
//!
//! ```
//! use hdkeys::{network::BITCOIN_MAINNET, HDNode};
//!
//! let seed = [0x42u8; 32];
//! let master = HDNode::from_seed(&seed, BITCOIN_MAINNET).unwrap();
//! let account = master.derive_path("m/44'/0'/0'").unwrap();
//! let receive_key = account.derive_path("m/0/0").unwrap();
//! println!("{}", receive_key.get_address());
//! ```

mod base58check;
pub mod ecc;
mod error;
pub mod hash;
mod hdnode;
mod keypair;
pub mod network;

pub use error::{Error, Result};
pub use hdnode::{HDNode, HARDENED_BIT, MAX_DERIVATION_RETRIES};
pub use keypair::KeyPair;
pub use network::Network;
