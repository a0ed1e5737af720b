
use base64::Engine;
use srtp::protection_profile::ProtectionProfile;

use crate::error::{Error, Result};

const INLINE_PREFIX: &str = "inline:";

/// MasterKey is the master key and salt of one direction, bound to the
/// profile they were sized for.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey {
    pub profile: ProtectionProfile,
    pub key: Vec<u8>,
    pub salt: Vec<u8>,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("profile", &self.profile)
            .field("key_len", &self.key.len())
            .field("salt_len", &self.salt.len())
            .finish()
    }
}

impl MasterKey {
    /// Splits concatenated `key || salt` at the profile's key length. No
    /// length check happens here; the engine rejects wrongly sized keys.
    pub fn from_concatenated(profile: ProtectionProfile, material: &[u8]) -> Self {
        let (key, salt) = material.split_at(profile.key_len().min(material.len()));
        MasterKey {
            profile,
            key: key.to_vec(),
            salt: salt.to_vec(),
        }
    }
}

/// Decodes SDES key params (`inline:<base64>`) into the master key and
/// salt for `profile`.
///
/// Lifetime (`|2^20`) and MKI (`|1:4`) suffixes are recognized and
/// rejected as unsupported.
pub fn parse_key_params(key_params: &str, profile: ProtectionProfile) -> Result<MasterKey> {
    let encoded = key_params.strip_prefix(INLINE_PREFIX).ok_or_else(|| {
        Error::BadEncoding(format!("key method must be {INLINE_PREFIX:?}"))
    })?;

    if let Some((_, options)) = encoded.split_once('|') {
        return Err(Error::UnsupportedOption(describe_options(options)));
    }

    let material = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::BadEncoding(e.to_string()))?;

    let expected = profile.master_len();
    if material.len() != expected {
        return Err(Error::KeyLengthMismatch {
            expected,
            actual: material.len(),
        });
    }

    Ok(MasterKey::from_concatenated(profile, &material))
}

fn describe_options(options: &str) -> String {
    options
        .split('|')
        .map(|option| {
            if option.starts_with("2^") || option.chars().all(|c| c.is_ascii_digit()) {
                format!("lifetime {option}")
            } else if option.contains(':') {
                format!("mki {option}")
            } else {
                format!("unknown {option:?}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
