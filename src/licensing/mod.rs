// Slate Log - Licensing
// Trial (entry quota per project), Purchased, Rental (key-based), Dev (internal)
// Keys validated offline via BLAKE3 keyed hash

use serde::{Deserialize, Serialize};

use crate::constants::TRIAL_ENTRY_LIMIT;
use crate::error::{Result, SlateLogError};

/// License key prefixes
const PREFIX_PURCHASED: &str = "SLOG-P-";
const PREFIX_RENTAL: &str = "SLOG-R-";
const PREFIX_DEV: &str = "SLOG-D-";

/// Keychain service name
const KEYCHAIN_SERVICE: &str = "com.slatelog.app";
const KEYCHAIN_KEY_ACCOUNT: &str = "license-key";

/// Secret key for BLAKE3 keyed hashing (32 bytes)
const VALIDATION_SECRET: [u8; 32] = [
    0x5e, 0x19, 0xc2, 0x7a, 0x0b, 0xe4, 0x38, 0x91,
    0xad, 0x63, 0x2f, 0xd0, 0x84, 0x1c, 0x7e, 0xb5,
    0x42, 0xf9, 0x06, 0x6b, 0xc8, 0x3d, 0x95, 0x1a,
    0xe7, 0x50, 0x2c, 0xbf, 0x73, 0x08, 0xda, 0x4e,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Trial,
    Purchased,
    Rental,
    Dev,
}

impl std::str::FromStr for LicenseType {
    type Err = SlateLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "purchased" => Ok(LicenseType::Purchased),
            "rental" => Ok(LicenseType::Rental),
            "dev" => Ok(LicenseType::Dev),
            "trial" => Ok(LicenseType::Trial),
            other => Err(SlateLogError::InvalidInput(format!("Unknown license type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LicenseState {
    pub license_type: LicenseType,
    /// True when a valid key is installed
    pub is_active: bool,
    pub key_hash: Option<String>,
}

impl LicenseState {
    pub fn trial() -> Self {
        Self {
            license_type: LicenseType::Trial,
            is_active: false,
            key_hash: None,
        }
    }

    fn licensed(license_type: LicenseType, key: &str) -> Self {
        Self {
            license_type,
            is_active: true,
            key_hash: Some(short_hash(key)),
        }
    }
}

fn short_hash(key: &str) -> String {
    let hash = blake3::hash(key.as_bytes());
    format!("{}", hash)[..16].to_string()
}

/// Get the current license state
pub fn check_license() -> LicenseState {
    if let Some(key) = get_stored_key() {
        if let Some(license_type) = validate_key(&key) {
            return LicenseState::licensed(license_type, &key);
        }
        log::warn!("Stored license key failed validation, falling back to trial");
    }

    LicenseState::trial()
}

/// Activate a license key
pub fn activate_key(key: &str) -> Result<LicenseState> {
    let key = key.trim();
    let license_type = validate_key(key)
        .ok_or_else(|| SlateLogError::License("Invalid license key".to_string()))?;

    store_key(key)?;
    log::info!("Activated {:?} license", license_type);

    Ok(LicenseState::licensed(license_type, key))
}

/// Deactivate current license (remove key from keychain)
pub fn deactivate() -> Result<()> {
    delete_stored_key()
}

/// Whether one more entry may be created in a project holding `entry_count` entries
pub fn may_accept_entry(state: &LicenseState, entry_count: i64) -> bool {
    match state.license_type {
        LicenseType::Trial => entry_count < TRIAL_ENTRY_LIMIT,
        _ => state.is_active,
    }
}

/// Generate a license key of the given type
pub fn generate_key(license_type: LicenseType) -> Option<String> {
    let prefix = match license_type {
        LicenseType::Purchased => PREFIX_PURCHASED,
        LicenseType::Rental => PREFIX_RENTAL,
        LicenseType::Dev => PREFIX_DEV,
        LicenseType::Trial => return None,
    };

    let payload = uuid::Uuid::new_v4().to_string().replace('-', "");
    let body = format!("{}{}", prefix, payload);
    let checksum = compute_checksum(&body);
    Some(format!("{}-{}", body, checksum))
}

// --- Key validation ---

/// Validate a license key format and keyed checksum. Returns the license type if valid.
pub fn validate_key(key: &str) -> Option<LicenseType> {
    let key = key.trim();

    let (license_type, prefix_len) = [
        (PREFIX_DEV, LicenseType::Dev),
        (PREFIX_PURCHASED, LicenseType::Purchased),
        (PREFIX_RENTAL, LicenseType::Rental),
    ]
    .into_iter()
    .find(|(prefix, _)| key.starts_with(prefix))
    .map(|(prefix, t)| (t, prefix.len()))?;

    // Everything before the last '-' is the body, after is the checksum
    let last_dash = key.rfind('-')?;
    if last_dash <= prefix_len {
        return None;
    }

    let (body, checksum) = (&key[..last_dash], &key[last_dash + 1..]);
    if checksum.len() != 8 {
        return None;
    }

    (compute_checksum(body) == checksum).then_some(license_type)
}

/// 8-char hex checksum for a key body
fn compute_checksum(body: &str) -> String {
    let mut hasher = blake3::Hasher::new_keyed(&VALIDATION_SECRET);
    hasher.update(body.as_bytes());
    let hash = hasher.finalize();
    format!("{}", hash)[..8].to_string()
}

// --- Keychain operations ---

fn keychain_entry() -> Result<keyring::Entry> {
    keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_KEY_ACCOUNT)
        .map_err(|e| SlateLogError::License(e.to_string()))
}

fn get_stored_key() -> Option<String> {
    keychain_entry().ok()?.get_password().ok()
}

fn store_key(key: &str) -> Result<()> {
    keychain_entry()?
        .set_password(key)
        .map_err(|e| SlateLogError::License(format!("Failed to store key: {}", e)))
}

fn delete_stored_key() -> Result<()> {
    match keychain_entry()?.delete_password() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()), // Already gone
        Err(e) => Err(SlateLogError::License(format!("Failed to remove key: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_each_type() {
        for (license_type, prefix) in [
            (LicenseType::Purchased, "SLOG-P-"),
            (LicenseType::Rental, "SLOG-R-"),
            (LicenseType::Dev, "SLOG-D-"),
        ] {
            let key = generate_key(license_type).unwrap();
            assert!(key.starts_with(prefix));
            assert_eq!(validate_key(&key), Some(license_type));
        }
    }

    #[test]
    fn test_trial_has_no_key() {
        assert!(generate_key(LicenseType::Trial).is_none());
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(validate_key("not-a-key").is_none());
        assert!(validate_key("SLOG-P-fake-12345678").is_none());
        assert!(validate_key("SLOG-X-abc-12345678").is_none());
        assert!(validate_key("").is_none());
    }

    #[test]
    fn test_tampered_key_rejected() {
        let key = generate_key(LicenseType::Purchased).unwrap();
        let idx = PREFIX_PURCHASED.len() + 2;
        let replacement = if &key[idx..idx + 1] == "a" { "b" } else { "a" };
        let tampered = format!("{}{}{}", &key[..idx], replacement, &key[idx + 1..]);
        assert!(validate_key(&tampered).is_none());
    }

    #[test]
    fn test_trial_quota() {
        let trial = LicenseState::trial();
        assert!(may_accept_entry(&trial, 0));
        assert!(may_accept_entry(&trial, TRIAL_ENTRY_LIMIT - 1));
        assert!(!may_accept_entry(&trial, TRIAL_ENTRY_LIMIT));
    }

    #[test]
    fn test_licensed_has_no_quota() {
        let key = generate_key(LicenseType::Rental).unwrap();
        let state = LicenseState::licensed(LicenseType::Rental, &key);
        assert!(may_accept_entry(&state, TRIAL_ENTRY_LIMIT * 10));
        assert_eq!(state.key_hash.as_ref().map(String::len), Some(16));
    }
}
