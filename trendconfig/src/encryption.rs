//! Chiffrement des secrets de session stockés dans la configuration
//!
//! Les jetons d'accès et de rafraîchissement sont persistés dans `config.yaml`.
//! Ils y sont scellés avec AES-256-GCM, la clé étant dérivée de l'identifiant
//! de la machine : le fichier n'est donc pas portable d'un poste à l'autre.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Préfixe des valeurs scellées
const SEALED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"trendlio-session-sealing-v1";
const NONCE_SALT: &[u8] = b"trendlio-nonce-v1";

/// Récupère l'identifiant de la machine
///
/// Sur Linux, lit `/etc/machine-id` puis `/var/lib/dbus/machine-id`.
/// Sur macOS, interroge `ioreg`.
fn get_machine_id() -> Result<String> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;

        let output_str = String::from_utf8_lossy(&output.stdout);
        for line in output_str.lines() {
            if line.contains("IOPlatformUUID") {
                if let Some(uuid) = line.split('"').nth(3) {
                    return Ok(uuid.to_string());
                }
            }
        }

        Err(anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "linux")]
    {
        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = std::fs::read_to_string(candidate) {
                let id = id.trim();
                if !id.is_empty() {
                    return Ok(id.to_string());
                }
            }
        }

        Err(anyhow!("Failed to read machine-id"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Err(anyhow!("Unsupported platform for machine id extraction"))
    }
}

/// Dérive une clé AES-256 depuis une graine arbitraire
pub fn derive_key_from(seed: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(KEY_SALT);

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

fn machine_key() -> Result<[u8; 32]> {
    Ok(derive_key_from(&get_machine_id()?))
}

/// Scelle un secret avec une clé explicite
///
/// Le résultat a la forme `encrypted:BASE64(nonce || ciphertext)`.
/// Le nonce est dérivé du secret : un même jeton produit toujours la même
/// valeur, ce qui évite de réécrire la configuration inutilement.
pub fn seal_with_key(key: &[u8; 32], secret: &str) -> Result<String> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(NONCE_SALT);
    let nonce_hash = hasher.finalize();
    let nonce = Nonce::from_slice(&nonce_hash[..12]);

    let ciphertext = cipher
        .encrypt(nonce, secret.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(12 + ciphertext.len());
    combined.extend_from_slice(&nonce_hash[..12]);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        SEALED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

/// Ouvre une valeur scellée avec une clé explicite
pub fn open_with_key(key: &[u8; 32], sealed: &str) -> Result<String> {
    let data = sealed
        .strip_prefix(SEALED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid sealed value (missing prefix)"))?;

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    let raw = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if raw.len() < 12 {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }

    let (nonce, ciphertext) = raw.split_at(12);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Scelle un secret avec la clé de la machine
pub fn seal_secret(secret: &str) -> Result<String> {
    seal_with_key(&machine_key()?, secret)
}

/// Indique si une valeur est scellée
pub fn is_sealed(value: &str) -> bool {
    value.starts_with(SEALED_PREFIX)
}

/// Retourne le secret en clair, qu'il soit scellé ou non
pub fn open_secret(value: &str) -> Result<String> {
    if is_sealed(value) {
        open_with_key(&machine_key()?, value)
    } else {
        Ok(value.to_string())
    }
}
