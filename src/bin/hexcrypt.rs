//! hexcrypt CLI - Passphrase-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! NaCl secretbox (XSalsa20Poly1305) with scrypt key derivation.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use hexcrypt::error::{ErrorCategory, HexcryptError, Result};
use hexcrypt::file_ops::{self, DecryptOptions, EncryptOptions};
use hexcrypt::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "hexcrypt")]
#[command(version)]
#[command(about = "Passphrase-based file encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Log more (-v for info, -vv for debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file, writing the result to its name without extension.
    ///
    /// Without --passphrase-stdin or --prompt a passphrase is generated
    /// and printed.
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Prompt for the passphrase on the terminal
        #[arg(long)]
        prompt: bool,

        /// Delete the input file after the encrypted file is written
        #[arg(long)]
        remove_source: bool,
    },

    /// Decrypt a file, restoring its original extension
    #[command(alias = "d")]
    Decrypt {
        /// Path to the encrypted file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Delete the encrypted file after the plaintext is restored
        #[arg(long)]
        remove_encoded: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encrypt {
            input,
            prompt,
            remove_source,
        } => {
            let passphrase = match (cli.passphrase_stdin, prompt) {
                (true, true) => {
                    return Err(HexcryptError::new(
                        ErrorCategory::User,
                        "--prompt and --passphrase-stdin cannot be combined",
                    ));
                }
                (true, false) | (false, true) => {
                    get_passphrase_reader(cli.passphrase_stdin).read_passphrase()?
                }
                (false, false) => Zeroizing::new(Vec::new()),
            };
            let encrypted = file_ops::encrypt_file_with_options(
                &input,
                &passphrase,
                EncryptOptions { remove_source },
            )?;

            println!("{}", encrypted.output_path.display());
            if encrypted.generated {
                // A generated passphrase exists nowhere else.
                println!(
                    "passphrase: {}",
                    String::from_utf8_lossy(&encrypted.passphrase)
                );
            }
            Ok(())
        }
        Commands::Decrypt {
            input,
            remove_encoded,
        } => {
            let passphrase = get_passphrase_reader(cli.passphrase_stdin).read_passphrase()?;
            let restored =
                file_ops::decrypt_file(&input, &passphrase, DecryptOptions { remove_encoded })?;
            println!("{}", restored.display());
            Ok(())
        }
    }
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "hexcrypt=warn",
        1 => "hexcrypt=info",
        _ => "hexcrypt=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Render an error and its sources as `outer: inner: innermost`.
fn error_chain(err: &HexcryptError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
