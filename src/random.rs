//! Secure random bytes for salts, nonces and generated passphrases

use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use rand::RngCore;
use rand::rngs::OsRng;

/// Fill `buf` from the operating system's CSPRNG.
///
/// Failure of the entropy source is returned as an error and never retried;
/// a salt or nonce with reduced entropy must not be produced.
pub fn fill(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Entropy,
            "secure random source unavailable",
            e,
        )
    })
}

/// Return `N` fresh random bytes.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    fill(&mut buf)?;
    Ok(buf)
}
