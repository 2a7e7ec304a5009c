//! Sealing and opening with NaCl secretbox (XSalsa20Poly1305)
//!
//! The ciphertext layout is:
//! - nonce: 24 bytes
//! - sealed box: variable length (16-byte Poly1305 MAC followed by the
//!   encrypted plaintext)
//!
//! There is no length field; the sealed box runs to the end of the input.

use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use crate::kdf::KEY_LEN;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Seal `plaintext` under `key` and `nonce`, returning `nonce || sealed box`.
pub fn seal(nonce: &[u8; NONCE_LEN], key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    let sealed_box = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| {
            HexcryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Secretbox,
                format!("encryption failed: {}", e),
            )
        })?;

    let mut output = Vec::with_capacity(NONCE_LEN + sealed_box.len());
    output.extend_from_slice(nonce);
    output.extend_from_slice(&sealed_box);
    Ok(output)
}

/// Open ciphertext produced by [`seal`], using the nonce stored in its first 24 bytes.
pub fn open(key: &[u8; KEY_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < NONCE_LEN + TAG_LEN {
        return Err(HexcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedInput,
            "input likely truncated; shorter than nonce and authentication tag",
        ));
    }
    let (nonce, sealed_box) = ciphertext.split_at(NONCE_LEN);

    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed_box)
        .map_err(|_| {
            HexcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad passphrase",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{SALT_LEN, derive_key};

    const KEY: [u8; KEY_LEN] = [0x11; KEY_LEN];
    const NONCE: [u8; NONCE_LEN] = [0x22; NONCE_LEN];

    #[test]
    fn test_nonce_prefix_and_length() {
        let ciphertext = seal(&NONCE, &KEY, b"hello").unwrap();
        assert_eq!(&ciphertext[..NONCE_LEN], &NONCE);
        assert_eq!(ciphertext.len(), NONCE_LEN + TAG_LEN + 5);
    }

    #[test]
    fn test_empty_plaintext() {
        let ciphertext = seal(&NONCE, &KEY, b"").unwrap();
        assert_eq!(ciphertext.len(), NONCE_LEN + TAG_LEN);
        assert_eq!(open(&KEY, &ciphertext).unwrap(), b"");
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let ciphertext = seal(&NONCE, &KEY, &plaintext).unwrap();
        assert_eq!(open(&KEY, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_different_nonce_different_ciphertext() {
        let ct1 = seal(&[1u8; NONCE_LEN], &KEY, b"hello world").unwrap();
        let ct2 = seal(&[2u8; NONCE_LEN], &KEY, b"hello world").unwrap();
        assert_ne!(ct1[NONCE_LEN..], ct2[NONCE_LEN..]);
    }

    #[test]
    fn test_wrong_key() {
        let ciphertext = seal(&NONCE, &KEY, b"secret data").unwrap();
        let err = open(&[0x12; KEY_LEN], &ciphertext).expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(
            err.to_string()
                .contains("corrupt input, tampered-with data, or bad passphrase")
        );
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let ciphertext = seal(&NONCE, &KEY, b"tamper me").unwrap();
        for byte in 0..ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = ciphertext.clone();
                tampered[byte] ^= 1 << bit;
                let err = open(&KEY, &tampered).expect_err("tampering went unnoticed");
                assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
            }
        }
    }

    #[test]
    fn test_truncated() {
        let err = open(&KEY, &[0u8; NONCE_LEN + TAG_LEN - 1]).expect_err("expected truncation");
        assert_eq!(err.kind, Some(ErrorKind::TruncatedInput));
    }

    #[test]
    fn test_cross_implementation_compatibility() {
        // Expected bytes were produced by an independent NaCl secretbox
        // implementation with the same passphrase, salt and nonce.
        let salt: [u8; SALT_LEN] = core::array::from_fn(|i| i as u8);
        let nonce: [u8; NONCE_LEN] = core::array::from_fn(|i| 100 + i as u8);
        let key = derive_key(b"correct horse", &salt).unwrap();

        let ciphertext = seal(&nonce, &key, b"hello").unwrap();

        assert_eq!(
            hex::encode(&ciphertext),
            "6465666768696a6b6c6d6e6f707172737475767778797a7b\
             d957f5d997bee701ed38217981b12f42582f3f3d01"
        );
        assert_eq!(open(&key, &ciphertext).unwrap(), b"hello");
    }
}
