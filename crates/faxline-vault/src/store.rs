// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed [`CredentialStore`] encrypted at rest.
//!
//! The vault directory holds two files: `secret.key` with 32 random bytes,
//! created on first save, and `credentials.enc` with the sealed JSON
//! credential. Both are replaced atomically via a temp file and rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use faxline_core::{CredentialStore, Credentials, FaxlineError};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};

/// Name of the key file inside the vault directory.
pub const KEY_FILE: &str = "secret.key";

/// Name of the sealed credential file inside the vault directory.
pub const CREDENTIALS_FILE: &str = "credentials.enc";

/// Encrypted credential file plus its key.
#[derive(Debug, Clone)]
pub struct EncryptedFileStore {
    dir: PathBuf,
}

impl EncryptedFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    fn read_key(&self) -> Result<Option<Zeroizing<[u8; KEY_LEN]>>, FaxlineError> {
        let path = self.key_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FaxlineError::Vault(format!(
                    "cannot read key file {}: {e}",
                    path.display()
                )));
            }
        };
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            FaxlineError::Vault(format!(
                "key file {} must be exactly {KEY_LEN} bytes",
                path.display()
            ))
        })?;
        Ok(Some(Zeroizing::new(key)))
    }

    fn load_or_create_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>, FaxlineError> {
        if let Some(key) = self.read_key()? {
            return Ok(key);
        }
        let key = crypto::generate_key()?;
        write_private(&self.key_path(), key.as_ref())?;
        debug!(path = %self.key_path().display(), "generated credential key");
        Ok(key)
    }
}

impl CredentialStore for EncryptedFileStore {
    fn load(&self) -> Result<Option<Credentials>, FaxlineError> {
        let blob = match fs::read(self.credentials_path()) {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FaxlineError::Vault(format!(
                    "cannot read credential file: {e}"
                )));
            }
        };

        let Some(key) = self.read_key()? else {
            warn!("credential file present but key file missing; login required");
            return Err(FaxlineError::Vault(format!(
                "{} is missing; run `faxline login` again",
                self.key_path().display()
            )));
        };

        let plaintext = crypto::open(&key, &blob)?;
        let credentials = serde_json::from_slice(&plaintext)
            .map_err(|e| FaxlineError::Vault(format!("corrupt credential blob: {e}")))?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), FaxlineError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            FaxlineError::Vault(format!(
                "cannot create vault directory {}: {e}",
                self.dir.display()
            ))
        })?;
        let key = self.load_or_create_key()?;
        let json = Zeroizing::new(
            serde_json::to_vec(credentials)
                .map_err(|e| FaxlineError::Vault(format!("cannot encode credentials: {e}")))?,
        );
        let blob = crypto::seal(&key, &json)?;
        write_private(&self.credentials_path(), &blob)?;
        debug!("credentials saved");
        Ok(())
    }
}

/// Writes `bytes` to `path` through a sibling temp file, owner-only on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), FaxlineError> {
    let tmp = path.with_extension("tmp");
    let io_err =
        |e: std::io::Error| FaxlineError::Vault(format!("cannot write {}: {e}", path.display()));

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn creds() -> Credentials {
        Credentials {
            access_token: "access-123".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            refresh_token: Some("refresh-456".into()),
        }
    }

    #[test]
    fn empty_vault_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_credentials_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path().join("vault"));
        store.save(&creds()).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds()));
    }

    #[test]
    fn file_on_disk_is_not_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        store.save(&creds()).unwrap();
        let raw = fs::read(store.credentials_path()).unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(!text.contains("access-123"));
        assert!(!text.contains("refresh-456"));
    }

    #[test]
    fn key_is_reused_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        store.save(&creds()).unwrap();
        let first = fs::read(store.key_path()).unwrap();
        store.save(&creds()).unwrap();
        assert_eq!(first, fs::read(store.key_path()).unwrap());
    }

    #[test]
    fn missing_key_is_a_vault_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        store.save(&creds()).unwrap();
        fs::remove_file(store.key_path()).unwrap();
        assert!(matches!(store.load(), Err(FaxlineError::Vault(_))));
    }

    #[test]
    fn replaced_key_fails_to_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        store.save(&creds()).unwrap();
        fs::write(store.key_path(), [7u8; KEY_LEN]).unwrap();
        assert!(store.load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path());
        store.save(&creds()).unwrap();
        let mode = fs::metadata(store.key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
