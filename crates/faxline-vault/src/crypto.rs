// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM sealing for the credential blob.
//!
//! A sealed blob is `nonce (12 bytes) || ciphertext || tag (16 bytes)`. Every
//! seal draws a fresh nonce from the system CSPRNG.

use faxline_core::FaxlineError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Key length for AES-256.
pub const KEY_LEN: usize = 32;

fn cipher(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, FaxlineError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| FaxlineError::Vault("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypts `plaintext` and returns `nonce || ciphertext_with_tag`.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, FaxlineError> {
    let cipher = cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| FaxlineError::Vault("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    cipher
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| FaxlineError::Vault("AES-256-GCM encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(blob)
}

/// Decrypts a blob produced by [`seal`].
///
/// Fails on a wrong key, a truncated blob, or any tampering.
pub fn open(key: &[u8; KEY_LEN], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, FaxlineError> {
    if blob.len() < NONCE_LEN {
        return Err(FaxlineError::Vault(
            "credential blob is shorter than a nonce".to_string(),
        ));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| FaxlineError::Vault("malformed nonce".to_string()))?;

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext = cipher(key)?
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            FaxlineError::Vault(
                "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;

    Ok(Zeroizing::new(plaintext.to_vec()))
}

/// A fresh random AES-256 key.
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_LEN]>, FaxlineError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    SystemRandom::new()
        .fill(key.as_mut())
        .map_err(|_| FaxlineError::Vault("failed to generate random key".to_string()))?;
    Ok(key)
}
