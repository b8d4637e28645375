//! Archive-and-seal stage.
//!
//! Bundles the capture file and metadata record into one tar archive,
//! compresses it at maximum ratio, encrypts it with AES-256-GCM under a key
//! derived from the run's one-time passphrase, and writes a SHA-256 digest
//! of the encrypted bytes. The passphrase reaches the cipher as a library
//! argument only; it never appears in any process argument list.
//!
//! Sealed artifact layout: `salt (16) ‖ nonce (12) ‖ ciphertext+tag`.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;

use topic_dump_shared::types::{DumpMetadata, DumpRequest, Secret};

use crate::errors::SealError;
use crate::workdir::WorkDir;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Filesystem locations one seal operation reads and writes.
#[derive(Debug, Clone)]
pub struct SealPaths {
    pub capture: PathBuf,
    pub metadata: PathBuf,
    pub archive: PathBuf,
    pub sealed: PathBuf,
    pub digest: PathBuf,
}

impl SealPaths {
    pub fn from_workdir(dir: &WorkDir, request: &DumpRequest) -> Self {
        Self {
            capture: dir.capture_path(&request.topic),
            metadata: dir.metadata_path(),
            archive: dir.archive_path(&request.request_id),
            sealed: dir.sealed_path(&request.request_id),
            digest: dir.digest_path(&request.request_id),
        }
    }
}

/// The encrypted artifact ready for publication.
#[derive(Debug, Clone)]
pub struct SealedArtifact {
    pub sealed_path: PathBuf,
    pub digest_path: PathBuf,
    /// Hex SHA-256 of the sealed bytes.
    pub sha256: String,
    pub bytes: u64,
}

/// Trait for sealing a capture into an encrypted artifact.
#[async_trait]
pub trait SealArtifact: Send + Sync {
    async fn seal(
        &self,
        paths: &SealPaths,
        metadata: &DumpMetadata,
        passphrase: &Secret,
    ) -> Result<SealedArtifact, SealError>;
}

/// Production sealer: tar + gzip + AES-256-GCM + SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveSealer;

impl ArchiveSealer {
    pub fn new() -> Self {
        Self
    }

    fn build_archive(paths: &SealPaths, metadata: &DumpMetadata) -> Result<(), SealError> {
        fs::write(&paths.metadata, serde_json::to_vec_pretty(metadata)?)?;

        let archive = File::create(&paths.archive)?;
        let encoder = GzEncoder::new(archive, Compression::best());
        let mut builder = tar::Builder::new(encoder);
        builder.append_path_with_name(&paths.capture, file_name(&paths.capture))?;
        builder.append_path_with_name(&paths.metadata, file_name(&paths.metadata))?;
        builder.into_inner()?.finish()?;
        Ok(())
    }

    fn encrypt_archive(paths: &SealPaths, passphrase: &Secret) -> Result<(), SealError> {
        let plaintext = fs::read(&paths.archive)?;

        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut salt);
        rand::thread_rng().fill(&mut nonce);

        let cipher = Aes256Gcm::new_from_slice(&derive_key(passphrase, &salt)?)
            .map_err(|_| SealError::Encrypt)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| SealError::Encrypt)?;

        let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        fs::write(&paths.sealed, sealed)?;
        Ok(())
    }

    /// Decrypts and unpacks a sealed artifact into `out_dir`.
    ///
    /// The inverse of [`SealArtifact::seal`]; used for verification and by
    /// the recipient's tooling.
    pub fn unseal(
        &self,
        sealed_path: &Path,
        passphrase: &Secret,
        out_dir: &Path,
    ) -> Result<(), SealError> {
        let sealed = fs::read(sealed_path)?;
        if sealed.len() <= SALT_LEN + NONCE_LEN {
            return Err(SealError::MalformedArtifact);
        }
        let (salt, rest) = sealed.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(&derive_key(passphrase, salt)?)
            .map_err(|_| SealError::AuthenticationFailed)?;
        let archive = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SealError::AuthenticationFailed)?;

        fs::create_dir_all(out_dir)?;
        tar::Archive::new(GzDecoder::new(Cursor::new(archive))).unpack(out_dir)?;
        Ok(())
    }
}

#[async_trait]
impl SealArtifact for ArchiveSealer {
    async fn seal(
        &self,
        paths: &SealPaths,
        metadata: &DumpMetadata,
        passphrase: &Secret,
    ) -> Result<SealedArtifact, SealError> {
        Self::build_archive(paths, metadata)?;
        Self::encrypt_archive(paths, passphrase)?;

        let bytes = fs::metadata(&paths.sealed)?.len();
        if bytes <= (SALT_LEN + NONCE_LEN) as u64 {
            return Err(SealError::EmptyArtifact);
        }

        let sha256 = sha256_file(&paths.sealed)?;
        fs::write(
            &paths.digest,
            format!("{sha256}  {}\n", file_name(&paths.sealed)),
        )?;

        // Plaintext must not be observable once sealing succeeded, even
        // though the whole working directory is removed later.
        fs::remove_file(&paths.capture)?;
        fs::remove_file(&paths.archive)?;

        info!(
            artifact = %paths.sealed.display(),
            bytes,
            "capture sealed"
        );

        Ok(SealedArtifact {
            sealed_path: paths.sealed.clone(),
            digest_path: paths.digest.clone(),
            sha256,
            bytes,
        })
    }
}

fn derive_key(passphrase: &Secret, salt: &[u8]) -> Result<[u8; 32], SealError> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(passphrase.expose().as_bytes(), salt, &mut key)
        .map_err(|e| SealError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

fn sha256_file(path: &Path) -> Result<String, SealError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
