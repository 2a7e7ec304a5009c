//! Hex-encoded on-disk format
//!
//! An encoded file is three lowercase hex fields joined by `\n`:
//!
//! ```text
//! hex(nonce || sealed box)
//! hex(salt)
//! hex(original extension, e.g. ".txt", or empty)
//! ```
//!
//! It is written to the original path with its extension removed.

use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use crate::file_ops;
use crate::kdf::SALT_LEN;
use std::path::{Path, PathBuf};

/// Field separator.
const SEPARATOR: &str = "\n";

/// Mode of encoded files on Unix.
const ENCODED_FILE_MODE: u32 = 0o644;

/// The decoded contents of an encoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    /// Nonce followed by the sealed box.
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    /// Original extension including the leading dot, or empty.
    pub extension: String,
}

/// Split `path` into the path without its extension and the extension.
///
/// The extension runs from the last `.` of the final path component to
/// its end, dot included. Dots in directory names are not considered.
/// A final component without a dot has an empty extension and the path
/// is returned unchanged.
pub fn split_extension(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| {
            HexcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} does not name a file", path.display()),
            )
        })?
        .to_str()
        .ok_or_else(|| {
            HexcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("file name of {} is not valid UTF-8", path.display()),
            )
        })?;

    let Some(dot) = name.rfind('.') else {
        return Ok((path.to_path_buf(), String::new()));
    };
    let (stem, extension) = name.split_at(dot);
    if matches!(stem, "" | "." | "..") {
        // e.g. ".env" or "..env": nothing usable is left to write to.
        return Err(HexcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!(
                "{} has no name left once its extension is removed",
                path.display()
            ),
        ));
    }
    Ok((path.with_file_name(stem), extension.to_string()))
}

/// Join the hex-encoded fields in their fixed order.
pub fn encode(ciphertext: &[u8], salt: &[u8; SALT_LEN], extension: &str) -> String {
    [
        hex::encode(ciphertext),
        hex::encode(salt),
        hex::encode(extension.as_bytes()),
    ]
    .join(SEPARATOR)
}

/// Parse the text of an encoded file.
///
/// A single trailing newline is tolerated.
pub fn decode(text: &str) -> Result<EncodedFile> {
    let mut fields: Vec<&str> = text.split(SEPARATOR).collect();
    if fields.len() == 4 && fields[3].is_empty() {
        fields.pop();
    }
    let &[ciphertext, salt, extension] = fields.as_slice() else {
        return Err(HexcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            format!(
                "expected 3 newline-separated fields, found {}",
                fields.len()
            ),
        ));
    };

    let ciphertext = decode_field("ciphertext", ciphertext)?;

    let salt: [u8; SALT_LEN] = decode_field("salt", salt)?
        .try_into()
        .map_err(|v: Vec<u8>| {
            HexcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::EncodingInvalid,
                format!("salt must be {} bytes, got {}", SALT_LEN, v.len()),
            )
        })?;

    let extension = String::from_utf8(decode_field("extension", extension)?).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            "extension is not valid UTF-8",
            e,
        )
    })?;
    if !is_plain_extension(&extension) {
        return Err(HexcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            format!("{:?} is not a file extension", extension),
        ));
    }

    Ok(EncodedFile {
        ciphertext,
        salt,
        extension,
    })
}

/// Encode and write the output for `original_path`, returning the path written.
///
/// The output replaces whatever is at the extension-less path. There is no
/// collision check.
pub fn write_encoded(
    original_path: &Path,
    salt: &[u8; SALT_LEN],
    ciphertext: &[u8],
) -> Result<PathBuf> {
    let (output_path, extension) = split_extension(original_path)?;
    let encoded = encode(ciphertext, salt, &extension);
    file_ops::write_file_atomic(&output_path, encoded.as_bytes(), ENCODED_FILE_MODE)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(output_path)
}

fn decode_field(name: &str, field: &str) -> Result<Vec<u8>> {
    hex::decode(field).map_err(|e| {
        HexcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            format!("{} field is not valid hex", name),
            e,
        )
    })
}

/// Empty, or a single leading dot followed by anything but dots and path
/// separators.
fn is_plain_extension(extension: &str) -> bool {
    match extension.strip_prefix('.') {
        Some(rest) => !rest.contains(['.', '/', '\\', '\0']),
        None => extension.is_empty(),
    }
}
