//! Base58Check codec: Base58 framed with a 4-byte double-SHA-256 checksum.

use base58::{FromBase58, ToBase58};

use crate::error::{Error, Result};
use crate::hash::sha256;

const CHECKSUM_LEN: usize = 4;

/// Appends a 4-byte double-SHA-256 checksum to `payload` and Base58-encodes it.
pub fn encode(payload: &[u8]) -> String {
    let checksum = sha256(&sha256(payload));
    let mut buffer = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    buffer.extend_from_slice(payload);
    buffer.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    buffer.to_base58()
}

/// Base58-decodes `s` and verifies its trailing 4-byte checksum, returning
/// the payload with the checksum stripped.
pub fn decode(s: &str) -> Result<Vec<u8>> {
    let data = s
        .from_base58()
        .map_err(|_| Error::InvalidEncoding("invalid base58 character set".into()))?;

    if data.len() < CHECKSUM_LEN {
        return Err(Error::InvalidEncoding(
            "base58check payload shorter than checksum".into(),
        ));
    }

    let (payload, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    let expected = sha256(&sha256(payload));
    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(Error::InvalidEncoding("checksum mismatch".into()));
    }

    Ok(payload.to_vec())
}
