//! hexcrypt - passphrase-based file encryption with scrypt and NaCl secretbox,
//! stored as a small hex-encoded text file

#![forbid(unsafe_code)]

pub mod encoding;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod random;
pub mod secretcrypt;
