
use crate::context::SRTCP_INDEX_SIZE;

/// ProtectionProfile specifies Cipher and AuthTag details, similar to TLS cipher suite
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ProtectionProfile {
    #[default]
    Aes128CmHmacSha1_80 = 0x0001,
    Aes128CmHmacSha1_32 = 0x0002,
    AeadAes128Gcm = 0x0007,
    AeadAes256Gcm = 0x0008,
}

impl ProtectionProfile {
    /// Numeric identifier as registered for DTLS-SRTP (RFC 5764, RFC 7714).
    pub fn id(&self) -> u16 {
        *self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(ProtectionProfile::Aes128CmHmacSha1_80),
            0x0002 => Some(ProtectionProfile::Aes128CmHmacSha1_32),
            0x0007 => Some(ProtectionProfile::AeadAes128Gcm),
            0x0008 => Some(ProtectionProfile::AeadAes256Gcm),
            _ => None,
        }
    }

    pub fn is_aead(&self) -> bool {
        matches!(
            *self,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm
        )
    }

    pub fn key_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_32
            | ProtectionProfile::Aes128CmHmacSha1_80
            | ProtectionProfile::AeadAes128Gcm => 16,
            ProtectionProfile::AeadAes256Gcm => 32,
        }
    }

    pub fn salt_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_32 | ProtectionProfile::Aes128CmHmacSha1_80 => 14,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => 12,
        }
    }

    /// Length of the master key followed by the master salt.
    pub fn master_len(&self) -> usize {
        self.key_len() + self.salt_len()
    }

    pub fn rtp_auth_tag_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80 => 10,
            ProtectionProfile::Aes128CmHmacSha1_32 => 4,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => 0,
        }
    }

    pub fn rtcp_auth_tag_len(&self) -> usize {
        match *self {
            // SRTCP always carries the 80 bit tag, RFC 5764 section 4.1.2.
            ProtectionProfile::Aes128CmHmacSha1_80 | ProtectionProfile::Aes128CmHmacSha1_32 => 10,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => 0,
        }
    }

    pub fn aead_auth_tag_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80 | ProtectionProfile::Aes128CmHmacSha1_32 => 0,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => 16,
        }
    }

    pub fn auth_key_len(&self) -> usize {
        match *self {
            ProtectionProfile::Aes128CmHmacSha1_80 | ProtectionProfile::Aes128CmHmacSha1_32 => 20,
            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => 0,
        }
    }

    /// Bytes added to an RTP packet by protection.
    pub fn rtp_overhead(&self) -> usize {
        self.rtp_auth_tag_len() + self.aead_auth_tag_len()
    }

    /// Bytes added to an RTCP packet by protection, including the SRTCP index.
    pub fn rtcp_overhead(&self) -> usize {
        self.rtcp_auth_tag_len() + self.aead_auth_tag_len() + SRTCP_INDEX_SIZE
    }
}
