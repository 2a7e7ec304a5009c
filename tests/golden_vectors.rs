//! Golden test vector validation

use hexcrypt::file_ops::{self, DecryptOptions};
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

/// All binary fields are hex encoded.
#[derive(Debug, Deserialize)]
struct GoldenVector {
    passphrase: String,
    plaintext: String,
    salt: String,
    nonce: String,
    extension: String,
    encoded: String,
    comment: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

/// Run golden vector tests on specified indices
///
/// If `indices` is None, tests all vectors. Otherwise tests only
/// the specified indices.
fn run_golden_vector_tests(indices: Option<&[usize]>) {
    let vectors = load_golden_vectors();

    let selected: Vec<usize> = match indices {
        Some(idx) => {
            for &i in idx {
                assert!(
                    i < vectors.len(),
                    "Index {} is out of bounds (only {} vectors available)",
                    i,
                    vectors.len()
                );
            }
            idx.to_vec()
        }
        None => (0..vectors.len()).collect(),
    };

    let mut failed = 0;
    for &i in &selected {
        let vector = &vectors[i];
        if let Err(msg) = check_vector(vector) {
            eprintln!("Vector {}: FAILED - {}", i, msg);
            eprintln!("  Comment: {}", vector.comment);
            failed += 1;
        }
    }

    println!(
        "Results: {} passed, {} failed out of {} total",
        selected.len() - failed,
        failed,
        selected.len()
    );
    assert_eq!(failed, 0, "Some golden vectors failed validation");
    assert!(!selected.is_empty(), "No golden vectors were tested");
}

fn check_vector(vector: &GoldenVector) -> Result<(), String> {
    let passphrase = hex::decode(&vector.passphrase).map_err(|e| e.to_string())?;
    let plaintext = hex::decode(&vector.plaintext).map_err(|e| e.to_string())?;
    let salt: [u8; 32] = hex::decode(&vector.salt)
        .map_err(|e| e.to_string())?
        .try_into()
        .map_err(|v: Vec<u8>| format!("salt must be 32 bytes, got {}", v.len()))?;
    let nonce: [u8; 24] = hex::decode(&vector.nonce)
        .map_err(|e| e.to_string())?
        .try_into()
        .map_err(|v: Vec<u8>| format!("nonce must be 24 bytes, got {}", v.len()))?;

    let temp_dir = TempDir::new().map_err(|e| e.to_string())?;
    let source = temp_dir.path().join(format!("data{}", vector.extension));
    fs::write(&source, &plaintext).map_err(|e| e.to_string())?;

    // Encrypting with the pinned salt and nonce must reproduce the file byte for byte.
    let output = file_ops::encrypt_file_deterministic(&source, &passphrase, &salt, &nonce)
        .map_err(|e| format!("failed to encrypt: {}", e))?;
    if output != temp_dir.path().join("data") {
        return Err(format!("unexpected output path {}", output.display()));
    }
    let encoded = fs::read_to_string(&output).map_err(|e| e.to_string())?;
    if encoded != vector.encoded {
        return Err(format!(
            "encoded mismatch\n  Expected: {}\n  Actual:   {}",
            vector.encoded, encoded
        ));
    }

    // And the checked-in encoding must decrypt back to the plaintext.
    let restored = file_ops::decrypt_file(&output, &passphrase, DecryptOptions::default())
        .map_err(|e| format!("failed to decrypt: {}", e))?;
    if restored != source {
        return Err(format!("unexpected restored path {}", restored.display()));
    }
    let decrypted = fs::read(&restored).map_err(|e| e.to_string())?;
    if decrypted != plaintext {
        return Err(format!(
            "plaintext mismatch: expected {} bytes, got {}",
            plaintext.len(),
            decrypted.len()
        ));
    }
    Ok(())
}

/// Test a small subset of diverse golden vectors for regular testing
/// (speed in debug mode makes these tests slow due to scrypt).
#[test]
fn test_golden_vectors_subset() {
    // explicit passphrase + extension, no extension, empty passphrase
    let test_indices = [1, 2, 5];
    run_golden_vector_tests(Some(&test_indices));
}

/// Test all golden vectors (run with --ignored flag)
///
/// Run with: cargo test test_all_golden_vectors -- --ignored
#[test]
#[ignore]
fn test_all_golden_vectors() {
    run_golden_vector_tests(None);
}
