//! Passphrase sources and generation

use crate::error::{ErrorCategory, ErrorKind, HexcryptError, Result};
use crate::random;
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Number of random bytes behind a generated passphrase. Hex encoding
/// doubles this into a 32-character printable passphrase.
pub const GENERATED_PASSPHRASE_BYTES: usize = 16;

/// Generate a fresh passphrase: 16 random bytes, lowercase hex encoded.
pub fn generate() -> Result<Zeroizing<Vec<u8>>> {
    let raw = Zeroizing::new(random::random_bytes::<GENERATED_PASSPHRASE_BYTES>()?);
    Ok(Zeroizing::new(hex::encode(&raw[..]).into_bytes()))
}

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Reads passphrase from any io::Read source
///
/// All bytes up to end of input are used verbatim, including any trailing
/// newline.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            HexcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(HexcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Passphrase (hexcrypt): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                HexcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword hands back a plain String; move it into a zeroizing
        // buffer straight away.
        let passphrase = rpassword::read_password().map_err(|e| {
            HexcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}
