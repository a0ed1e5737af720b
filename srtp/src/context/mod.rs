#[cfg(test)]
mod context_test;

use std::collections::HashMap;

use util::replay_detector::*;

use crate::cipher::cipher_aead_aes_gcm::*;
use crate::cipher::cipher_aes_cm_hmac_sha1::*;
use crate::cipher::*;
use crate::error::{Error, Result};
use crate::header_extension::HeaderExtensionCipher;
use crate::option::*;
use crate::protection_profile::*;

pub mod srtcp;
pub mod srtp;

pub const MAX_ROC_DISORDER: u16 = 100;
pub const MAX_SEQUENCE_NUMBER: u16 = 65535;
/// SRTCP index is 31 bits, the top bit of the ESRTCP word is the E flag.
pub const MAX_SRTCP_INDEX: usize = 0x7FFF_FFFF;
pub const SRTCP_INDEX_SIZE: usize = 4;

/// Encrypt/Decrypt state for a single SRTP SSRC
#[derive(Default)]
pub(crate) struct SrtpSsrcState {
    ssrc: u32,
    rollover_counter: u32,
    rollover_has_processed: bool,
    last_sequence_number: u16,
    replay_detector: Option<Box<dyn ReplayDetector + Send + 'static>>,
}

/// Encrypt/Decrypt state for a single SRTCP SSRC
#[derive(Default)]
pub(crate) struct SrtcpSsrcState {
    srtcp_index: usize,
    replay_detector: Option<Box<dyn ReplayDetector + Send + 'static>>,
}

impl SrtpSsrcState {
    /// Estimates the rollover counter of `sequence_number` relative to the
    /// last processed packet. Fails once the counter would pass `u32::MAX`.
    pub fn next_rollover_count(&self, sequence_number: u16) -> Result<u32> {
        let roc = self.rollover_counter;

        let next = if !self.rollover_has_processed {
            Some(roc)
        } else if sequence_number == 0 {
            // We exactly hit the rollover count

            // Only update rolloverCounter if lastSequenceNumber is greater then MAX_ROCDISORDER
            // otherwise we already incremented for disorder
            if self.last_sequence_number > MAX_ROC_DISORDER {
                roc.checked_add(1)
            } else {
                Some(roc)
            }
        } else if self.last_sequence_number < MAX_ROC_DISORDER
            && sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            // Our last sequence number incremented because we crossed 0, but then our current number was within MAX_ROCDISORDER of the max
            // So we fell behind, drop to account for jitter
            Some(roc.saturating_sub(1))
        } else if sequence_number < MAX_ROC_DISORDER
            && self.last_sequence_number > (MAX_SEQUENCE_NUMBER - MAX_ROC_DISORDER)
        {
            // our current is within a MAX_ROCDISORDER of 0
            // and our last sequence number was a high sequence number, increment to account for jitter
            roc.checked_add(1)
        } else {
            Some(roc)
        };

        next.ok_or(Error::SrtpRolloverExhausted(self.ssrc))
    }

    /// https://tools.ietf.org/html/rfc3550#appendix-A.1
    pub fn update_rollover_count(&mut self, sequence_number: u16) -> Result<()> {
        self.rollover_counter = self.next_rollover_count(sequence_number)?;
        self.rollover_has_processed = true;
        self.last_sequence_number = sequence_number;
        Ok(())
    }
}

/// Context represents a SRTP cryptographic context
/// Context can only be used for one-way operations
/// it must either used ONLY for encryption or ONLY for decryption
pub struct Context {
    profile: ProtectionProfile,
    master_key: Vec<u8>,
    master_salt: Vec<u8>,

    cipher: Box<dyn Cipher + Send>,
    header_extension_cipher: Option<HeaderExtensionCipher>,
    external_auth: bool,

    srtp_ssrc_states: HashMap<u32, SrtpSsrcState>,
    srtcp_ssrc_states: HashMap<u32, SrtcpSsrcState>,

    new_srtp_replay_detector: ContextOption,
    new_srtcp_replay_detector: ContextOption,
}

impl Context {
    /// CreateContext creates a new SRTP Context
    pub fn new(
        master_key: &[u8],
        master_salt: &[u8],
        profile: ProtectionProfile,
        srtp_ctx_opt: Option<ContextOption>,
        srtcp_ctx_opt: Option<ContextOption>,
    ) -> Result<Context> {
        let key_len = profile.key_len();
        let salt_len = profile.salt_len();

        if master_key.len() != key_len {
            return Err(Error::SrtpMasterKeyLength(key_len, master_key.len()));
        } else if master_salt.len() != salt_len {
            return Err(Error::SrtpSaltLength(salt_len, master_salt.len()));
        }

        let cipher: Box<dyn Cipher + Send> = match profile {
            ProtectionProfile::Aes128CmHmacSha1_32 | ProtectionProfile::Aes128CmHmacSha1_80 => {
                Box::new(CipherAesCmHmacSha1::new(profile, master_key, master_salt)?)
            }

            ProtectionProfile::AeadAes128Gcm | ProtectionProfile::AeadAes256Gcm => {
                Box::new(CipherAeadAesGcm::new(profile, master_key, master_salt)?)
            }
        };

        let srtp_ctx_opt = if let Some(ctx_opt) = srtp_ctx_opt {
            ctx_opt
        } else {
            srtp_no_replay_protection()
        };

        let srtcp_ctx_opt = if let Some(ctx_opt) = srtcp_ctx_opt {
            ctx_opt
        } else {
            srtcp_no_replay_protection()
        };

        log::trace!("created srtp context for {profile:?}");

        Ok(Context {
            profile,
            master_key: master_key.to_vec(),
            master_salt: master_salt.to_vec(),
            cipher,
            header_extension_cipher: None,
            external_auth: false,
            srtp_ssrc_states: HashMap::new(),
            srtcp_ssrc_states: HashMap::new(),
            new_srtp_replay_detector: srtp_ctx_opt,
            new_srtcp_replay_detector: srtcp_ctx_opt,
        })
    }

    pub fn profile(&self) -> ProtectionProfile {
        self.profile
    }

    /// Selects the RTP header extension IDs whose data is encrypted
    /// (RFC 6904). An empty list turns header encryption off. AEAD
    /// profiles cannot encrypt header extensions.
    pub fn set_encrypted_header_extension_ids(&mut self, ids: &[u8]) -> Result<()> {
        if ids.is_empty() {
            self.header_extension_cipher = None;
            return Ok(());
        }
        if self.profile.is_aead() {
            return Err(Error::HeaderExtensionsUnsupportedWithAead);
        }

        self.header_extension_cipher = Some(HeaderExtensionCipher::new(
            &self.master_key,
            &self.master_salt,
            ids,
        )?);
        Ok(())
    }

    pub fn encrypted_header_extension_ids(&self) -> &[u8] {
        self.header_extension_cipher
            .as_ref()
            .map(|c| c.ids())
            .unwrap_or_default()
    }

    /// Stops writing RTP auth tags on encryption. Outgoing packets carry a
    /// zeroed placeholder of the tag length instead, to be filled in by
    /// the holder of [`Context::rtp_auth_key`]. Returns false and changes
    /// nothing for AEAD profiles.
    pub fn enable_external_auth(&mut self) -> bool {
        if self.cipher.enable_external_auth() {
            self.external_auth = true;
        }
        self.external_auth
    }

    pub fn is_external_auth(&self) -> bool {
        self.external_auth
    }

    /// Session key used for the HMAC-SHA1 RTP auth tag.
    pub fn rtp_auth_key(&self) -> Result<&[u8]> {
        if !self.external_auth {
            return Err(Error::ExternalAuthNotEnabled);
        }
        self.cipher
            .rtp_auth_key()
            .ok_or(Error::ExternalAuthNotEnabled)
    }

    fn get_srtp_ssrc_state(&mut self, ssrc: u32) -> &mut SrtpSsrcState {
        let s = SrtpSsrcState {
            ssrc,
            replay_detector: Some((self.new_srtp_replay_detector)()),
            ..Default::default()
        };

        self.srtp_ssrc_states.entry(ssrc).or_insert(s)
    }

    fn get_srtcp_ssrc_state(&mut self, ssrc: u32) -> &mut SrtcpSsrcState {
        let s = SrtcpSsrcState {
            replay_detector: Some((self.new_srtcp_replay_detector)()),
            ..Default::default()
        };
        self.srtcp_ssrc_states.entry(ssrc).or_insert(s)
    }

    /// roc returns SRTP rollover counter value of specified SSRC.
    pub fn get_roc(&self, ssrc: u32) -> Option<u32> {
        self.srtp_ssrc_states.get(&ssrc).map(|s| s.rollover_counter)
    }

    /// set_roc sets SRTP rollover counter value of specified SSRC.
    pub fn set_roc(&mut self, ssrc: u32, roc: u32) {
        self.get_srtp_ssrc_state(ssrc).rollover_counter = roc;
    }

    /// index returns SRTCP index value of specified SSRC.
    pub fn get_index(&self, ssrc: u32) -> Option<usize> {
        self.srtcp_ssrc_states.get(&ssrc).map(|s| s.srtcp_index)
    }

    /// set_index sets SRTCP index value of specified SSRC.
    pub fn set_index(&mut self, ssrc: u32, index: usize) {
        self.get_srtcp_ssrc_state(ssrc).srtcp_index = index;
    }
}
