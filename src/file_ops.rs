//! File encryption/decryption operations
//!
//! This module drives the whole pipeline: passphrase resolution, key
//! derivation, sealing and writing the hex-encoded output, plus the
//! matching decryption that restores the original file name.

use crate::encoding;
use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use crate::kdf::{self, SALT_LEN};
use crate::passphrase;
use crate::random;
use crate::secretcrypt::{self, NONCE_LEN};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Mode of restored plaintext files on Unix.
const PLAINTEXT_FILE_MODE: u32 = 0o600;

#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptOptions {
    /// Delete the source file once the encoded file is written, unless
    /// the two paths are the same.
    pub remove_source: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecryptOptions {
    /// Delete the encoded file once the plaintext is restored, unless the
    /// two paths are the same.
    pub remove_encoded: bool,
}

/// Outcome of [`encrypt_file`].
pub struct Encrypted {
    /// The passphrase the file was encrypted with. When it was generated
    /// this is the only copy.
    pub passphrase: Zeroizing<Vec<u8>>,
    /// Whether `passphrase` was generated rather than supplied.
    pub generated: bool,
    /// Where the encoded file was written.
    pub output_path: PathBuf,
}

/// Encrypt a file with a passphrase
///
/// An empty `passphrase` means one is generated. The encoded output is
/// written to `source_path` with its extension removed; the source itself
/// is left in place.
pub fn encrypt_file(source_path: &Path, passphrase: &[u8]) -> Result<Encrypted> {
    encrypt_file_with_options(source_path, passphrase, EncryptOptions::default())
}

/// Like [`encrypt_file`], with control over source removal.
pub fn encrypt_file_with_options(
    source_path: &Path,
    passphrase: &[u8],
    options: EncryptOptions,
) -> Result<Encrypted> {
    let (passphrase, generated) = resolve_passphrase(passphrase)?;

    let salt = random::random_bytes::<SALT_LEN>()?;
    let nonce = random::random_bytes::<NONCE_LEN>()?;
    debug!("drew fresh salt and nonce");

    let output_path = encrypt_file_deterministic(source_path, &passphrase, &salt, &nonce)?;

    if options.remove_source && output_path != source_path {
        fs::remove_file(source_path).map_err(|e| {
            HexcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!(
                    "encoded file written to {} but failed to remove {}",
                    output_path.display(),
                    source_path.display()
                ),
                e,
            )
        })?;
        info!(source = %source_path.display(), "removed source file");
    }

    Ok(Encrypted {
        passphrase,
        generated,
        output_path,
    })
}

/// Encrypt a file with the provided passphrase, salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt_file()` which generates
/// random salt/nonce. The passphrase is used as-is, even when empty.
pub fn encrypt_file_deterministic(
    source_path: &Path,
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<PathBuf> {
    let key = kdf::derive_key(passphrase, salt)?;
    debug!("derived key");

    let plaintext = fs::read(source_path).map_err(|e| read_error(source_path, e))?;
    let plaintext = Zeroizing::new(plaintext);
    let ciphertext = secretcrypt::seal(nonce, &key, &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;

    let output_path = encoding::write_encoded(source_path, salt, &ciphertext)?;
    info!(
        source = %source_path.display(),
        output = %output_path.display(),
        "wrote encoded file"
    );
    Ok(output_path)
}

/// Decrypt an encoded file with a passphrase
///
/// The plaintext is written to `encoded_path` with the stored extension
/// appended, which is the name the file had before encryption. Returns
/// that path.
pub fn decrypt_file(
    encoded_path: &Path,
    passphrase: &[u8],
    options: DecryptOptions,
) -> Result<PathBuf> {
    let encoded_bytes = fs::read(encoded_path).map_err(|e| read_error(encoded_path, e))?;
    let encoded = String::from_utf8(encoded_bytes).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            "encoded file is not valid UTF-8",
            e,
        )
    })?;
    let encoded = encoding::decode(&encoded).map_err(|e| e.with_context("failed to decode"))?;

    let key = kdf::derive_key(passphrase, &encoded.salt)?;
    let plaintext = Zeroizing::new(
        secretcrypt::open(&key, &encoded.ciphertext)
            .map_err(|e| e.with_context("failed to decrypt"))?,
    );

    let restored_path = restored_path(encoded_path, &encoded.extension)?;
    write_file_atomic(&restored_path, &plaintext, PLAINTEXT_FILE_MODE)
        .map_err(|e| e.with_context(format!("failed to write to {}", restored_path.display())))?;
    info!(output = %restored_path.display(), "restored plaintext");

    if options.remove_encoded && restored_path != encoded_path {
        fs::remove_file(encoded_path).map_err(|e| {
            HexcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!(
                    "plaintext restored to {} but failed to remove {}",
                    restored_path.display(),
                    encoded_path.display()
                ),
                e,
            )
        })?;
    }

    Ok(restored_path)
}

fn resolve_passphrase(passphrase: &[u8]) -> Result<(Zeroizing<Vec<u8>>, bool)> {
    if passphrase.is_empty() {
        info!("generating random passphrase");
        Ok((passphrase::generate()?, true))
    } else {
        info!("using user supplied passphrase");
        Ok((Zeroizing::new(passphrase.to_vec()), false))
    }
}

fn restored_path(encoded_path: &Path, extension: &str) -> Result<PathBuf> {
    let name = encoded_path.file_name().ok_or_else(|| {
        HexcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} does not name a file", encoded_path.display()),
        )
    })?;
    let mut name = name.to_os_string();
    name.push(extension);
    Ok(encoded_path.with_file_name(name))
}

/// Write `contents` to `path` atomically (tempfile + fsync + rename)
///
/// Either the previous file or the complete new one exists at `path`,
/// never a partial write. This also makes writing back to the path that
/// was just read safe.
pub(crate) fn write_file_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| {
                HexcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    temp_file.persist(path).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> HexcryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    HexcryptError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
