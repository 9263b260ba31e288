//! Digest calculation for file verification.
//!
//! Registries publish SHA-1 and SHA-512 digests. A file is always hashed with
//! the algorithm its expected digest came from, and comparison ignores hex
//! case.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha1::Sha1;
use sha2::{Digest, Sha512};

use super::error::{TransferError, TransferResult};

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithms understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha512,
}

impl HashAlgorithm {
    /// Human-readable algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha512 => "SHA-512",
        }
    }
}

/// An expected digest together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedHash {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl ExpectedHash {
    /// Expected SHA-1 digest.
    pub fn sha1(hex: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha1,
            hex: hex.into(),
        }
    }

    /// Expected SHA-512 digest.
    pub fn sha512(hex: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha512,
            hex: hex.into(),
        }
    }

    /// Case-insensitive comparison against a computed hex digest.
    pub fn matches(&self, actual: &str) -> bool {
        self.hex.trim().eq_ignore_ascii_case(actual.trim())
    }
}

/// Calculate the lowercase hex digest of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn calculate_file_digest(path: &Path, algorithm: HashAlgorithm) -> TransferResult<String> {
    match algorithm {
        HashAlgorithm::Sha1 => digest_file::<Sha1>(path),
        HashAlgorithm::Sha512 => digest_file::<Sha512>(path),
    }
}

/// Verify that a file matches an expected digest.
pub fn verify_file(path: &Path, expected: &ExpectedHash) -> TransferResult<()> {
    let actual = calculate_file_digest(path, expected.algorithm)?;
    if !expected.matches(&actual) {
        return Err(TransferError::ChecksumMismatch {
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected: expected.hex.clone(),
            actual,
        });
    }
    Ok(())
}

fn digest_file<D: Digest>(path: &Path) -> TransferResult<String>
where
    sha2::digest::Output<D>: std::fmt::LowerHex,
{
    let mut file = File::open(path).map_err(|e| TransferError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| TransferError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
