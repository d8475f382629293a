// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sender credential loading.
//!
//! The sender key is supplied either as a hex string or as a PEM file
//! (SEC1 `EC PRIVATE KEY` or PKCS#8 `PRIVATE KEY`).

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use super::client::{create_signer, ChainError};

/// Parse a PEM-encoded secp256k1 key into a hex string.
///
/// # Arguments
/// * `pem_bytes` - The PEM-encoded private key bytes
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(ChainError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, ChainError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, ChainError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    create_signer(&hex_key)
}

/// Read a PEM key file and create a signer from it.
pub fn signer_from_pem_file(path: &Path) -> Result<PrivateKeySigner, ChainError> {
    let bytes = std::fs::read(path).map_err(|e| {
        ChainError::InvalidPrivateKey(format!("Cannot read {}: {e}", path.display()))
    })?;
    signer_from_pem(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::pkcs8::{EncodePrivateKey, LineEnding};

    fn generated_pem() -> (SecretKey, String) {
        let bytes = alloy::hex::decode(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let key = SecretKey::from_slice(&bytes).unwrap();
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
        (key, pem)
    }

    #[test]
    fn test_pem_to_hex_pkcs8() {
        let (key, pem) = generated_pem();
        let hex = pem_to_hex(pem.as_bytes()).unwrap();
        assert_eq!(hex.len(), 64, "Hex key should be 64 characters");
        assert_eq!(hex, alloy::hex::encode(key.to_bytes()));
    }

    #[test]
    fn test_pem_to_hex_sec1() {
        let (key, _) = generated_pem();
        let sec1 = key.to_sec1_pem(LineEnding::LF).unwrap();
        let hex = pem_to_hex(sec1.as_bytes()).unwrap();
        assert_eq!(hex, alloy::hex::encode(key.to_bytes()));
    }

    #[test]
    fn test_signer_from_pem_file() {
        let (_, pem) = generated_pem();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sender.pem");
        std::fs::write(&path, pem).unwrap();

        let signer = signer_from_pem_file(&path).unwrap();
        assert_eq!(
            format!("{:?}", signer.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_rejects_non_pem() {
        assert!(matches!(
            pem_to_hex(b"definitely not a key"),
            Err(ChainError::InvalidPrivateKey(_))
        ));
    }
}
