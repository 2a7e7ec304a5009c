//! Passphrase key derivation using scrypt
//!
//! The cost parameters are part of the file format: N = 16384, r = 8,
//! p = 1, 32 byte output. Changing any of them makes existing files
//! undecryptable.

use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 32;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// scrypt log2(N) parameter (N = 16384)
const SCRYPT_LOG_N: u8 = 14;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Derive a 32-byte key from a passphrase and salt using scrypt
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        HexcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::Derivation,
            format!("failed to create scrypt params: {}", e),
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, salt, &params, &mut key[..]).map_err(|e| {
        HexcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::Derivation,
            format!("scrypt key derivation failed: {}", e),
        )
    })?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_parameter() {
        assert_eq!(1u32 << SCRYPT_LOG_N, 16384);
    }

    #[test]
    fn test_known_key() {
        // Reference value computed with an independent scrypt implementation.
        let key = derive_key(b"test", &[0x42u8; SALT_LEN]).unwrap();
        assert_eq!(
            hex::encode(&key[..]),
            "bb5029b9cfd0aeba20846eb72d9fed799c0888323494f4759f2afb1d380a9152"
        );
    }

    #[test]
    fn test_salt_changes_key() {
        let k1 = derive_key(b"test", &[1u8; SALT_LEN]).unwrap();
        let k2 = derive_key(b"test", &[2u8; SALT_LEN]).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_deterministic() {
        let k1 = derive_key(b"correct horse", &[7u8; SALT_LEN]).unwrap();
        let k2 = derive_key(b"correct horse", &[7u8; SALT_LEN]).unwrap();
        assert_eq!(*k1, *k2);
    }
}
