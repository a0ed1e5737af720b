
use std::collections::HashMap;
use std::sync::Arc;

use srtp::protection_profile::ProtectionProfile;

pub const CS_AES_CM_128_HMAC_SHA1_80: &str = "AES_CM_128_HMAC_SHA1_80";
pub const CS_AES_CM_128_HMAC_SHA1_32: &str = "AES_CM_128_HMAC_SHA1_32";
pub const CS_AEAD_AES_128_GCM: &str = "AEAD_AES_128_GCM";
pub const CS_AEAD_AES_256_GCM: &str = "AEAD_AES_256_GCM";

lazy_static! {
    static ref DEFAULT_REGISTRY: Arc<CryptoSuiteRegistry> = Arc::new(CryptoSuiteRegistry::new());
}

/// CryptoSuite binds an SDES suite name to the engine profile that
/// implements it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CryptoSuite {
    pub name: &'static str,
    pub profile: ProtectionProfile,
}

/// CryptoSuiteRegistry is an immutable table of the supported suites,
/// looked up by SDES name or by numeric id.
#[derive(Debug)]
pub struct CryptoSuiteRegistry {
    suites: Vec<CryptoSuite>,
    by_name: HashMap<&'static str, usize>,
}

impl Default for CryptoSuiteRegistry {
    fn default() -> Self {
        CryptoSuiteRegistry::new()
    }
}

impl CryptoSuiteRegistry {
    pub fn new() -> Self {
        let suites = vec![
            CryptoSuite {
                name: CS_AES_CM_128_HMAC_SHA1_80,
                profile: ProtectionProfile::Aes128CmHmacSha1_80,
            },
            CryptoSuite {
                name: CS_AES_CM_128_HMAC_SHA1_32,
                profile: ProtectionProfile::Aes128CmHmacSha1_32,
            },
            CryptoSuite {
                name: CS_AEAD_AES_128_GCM,
                profile: ProtectionProfile::AeadAes128Gcm,
            },
            CryptoSuite {
                name: CS_AEAD_AES_256_GCM,
                profile: ProtectionProfile::AeadAes256Gcm,
            },
        ];
        let by_name = suites
            .iter()
            .enumerate()
            .map(|(i, suite)| (suite.name, i))
            .collect();

        CryptoSuiteRegistry { suites, by_name }
    }

    /// Shared default table.
    pub fn shared() -> Arc<CryptoSuiteRegistry> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    pub fn suites(&self) -> &[CryptoSuite] {
        &self.suites
    }

    pub fn by_name(&self, name: &str) -> Option<&CryptoSuite> {
        self.by_name.get(name).map(|&i| &self.suites[i])
    }

    pub fn by_id(&self, id: u16) -> Option<&CryptoSuite> {
        self.suites.iter().find(|suite| suite.profile.id() == id)
    }

    pub fn by_profile(&self, profile: ProtectionProfile) -> Option<&CryptoSuite> {
        self.suites.iter().find(|suite| suite.profile == profile)
    }

    pub fn profile_by_name(&self, name: &str) -> Option<ProtectionProfile> {
        self.by_name(name).map(|suite| suite.profile)
    }

    pub fn name_of(&self, profile: ProtectionProfile) -> Option<&'static str> {
        self.by_profile(profile).map(|suite| suite.name)
    }

    /// Master key and salt lengths of the named suite.
    pub fn key_and_salt_len(&self, name: &str) -> Option<(usize, usize)> {
        self.by_name(name)
            .map(|suite| (suite.profile.key_len(), suite.profile.salt_len()))
    }

    pub fn is_aead(&self, name: &str) -> bool {
        self.by_name(name)
            .map(|suite| suite.profile.is_aead())
            .unwrap_or(false)
    }
}
