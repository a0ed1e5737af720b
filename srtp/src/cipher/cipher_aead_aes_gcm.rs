use aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use byteorder::{BigEndian, ByteOrder};
use bytes::{Bytes, BytesMut};
use rtcp::header::{HEADER_LENGTH, SSRC_LENGTH};
use util::marshal::*;

use super::Cipher;
use crate::context::SRTCP_INDEX_SIZE;
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::protection_profile::ProtectionProfile;

const RTCP_ENCRYPTION_FLAG: u8 = 0x80;
const AEAD_IV_LEN: usize = 12;

enum GcmInstance {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl GcmInstance {
    fn new(profile: ProtectionProfile, session_key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::SrtpMasterKeyLength(profile.key_len(), session_key.len());
        Ok(match profile {
            ProtectionProfile::AeadAes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(session_key).map_err(invalid)?;
                GcmInstance::Aes256(Box::new(cipher))
            }
            _ => {
                let cipher = Aes128Gcm::new_from_slice(session_key).map_err(invalid)?;
                GcmInstance::Aes128(Box::new(cipher))
            }
        })
    }

    fn encrypt(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce);
        Ok(match self {
            GcmInstance::Aes128(c) => c.encrypt(nonce, payload)?,
            GcmInstance::Aes256(c) => c.encrypt(nonce, payload)?,
        })
    }

    fn decrypt(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce);
        Ok(match self {
            GcmInstance::Aes128(c) => c.decrypt(nonce, payload)?,
            GcmInstance::Aes256(c) => c.decrypt(nonce, payload)?,
        })
    }
}

/// AEAD Cipher based on AES.
pub(crate) struct CipherAeadAesGcm {
    profile: ProtectionProfile,
    srtp_cipher: GcmInstance,
    srtcp_cipher: GcmInstance,
    srtp_session_salt: Vec<u8>,
    srtcp_session_salt: Vec<u8>,
}

impl Cipher for CipherAeadAesGcm {
    fn rtp_auth_tag_len(&self) -> usize {
        self.profile.rtp_auth_tag_len()
    }

    /// Get RTCP authenticated tag length.
    fn rtcp_auth_tag_len(&self) -> usize {
        self.profile.rtcp_auth_tag_len()
    }

    /// Get AEAD auth key length of the cipher.
    fn aead_auth_tag_len(&self) -> usize {
        self.profile.aead_auth_tag_len()
    }

    fn rtcp_index(&self, input: &[u8]) -> usize {
        let pos = input.len() - SRTCP_INDEX_SIZE;
        let val = BigEndian::read_u32(&input[pos..]);

        (val & !((RTCP_ENCRYPTION_FLAG as u32) << 24)) as usize
    }

    fn rtp_auth_key(&self) -> Option<&[u8]> {
        None
    }

    fn enable_external_auth(&mut self) -> bool {
        false
    }

    fn encrypt_rtp(
        &mut self,
        payload: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let header_len = header.marshal_size();
        let mut writer = BytesMut::with_capacity(payload.len() + self.aead_auth_tag_len());

        // Copy header unencrypted.
        writer.extend_from_slice(&payload[..header_len]);

        let nonce = self.rtp_initialization_vector(header, roc);

        let encrypted = self.srtp_cipher.encrypt(
            &nonce,
            Payload {
                msg: &payload[header_len..],
                aad: &writer,
            },
        )?;

        writer.extend(encrypted);
        Ok(writer.freeze())
    }

    fn decrypt_rtp(
        &mut self,
        ciphertext: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let payload_offset = header.marshal_size();
        if ciphertext.len() < payload_offset + self.aead_auth_tag_len() {
            return Err(Error::SrtpTooSmall(
                ciphertext.len(),
                payload_offset + self.aead_auth_tag_len(),
            ));
        }

        let nonce = self.rtp_initialization_vector(header, roc);
        let decrypted_msg = self
            .srtp_cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: &ciphertext[payload_offset..],
                    aad: &ciphertext[..payload_offset],
                },
            )
            .map_err(|_| Error::RtpFailedToVerifyAuthTag)?;

        let mut writer = BytesMut::with_capacity(payload_offset + decrypted_msg.len());
        writer.extend_from_slice(&ciphertext[..payload_offset]);
        writer.extend(decrypted_msg);

        Ok(writer.freeze())
    }

    fn encrypt_rtcp(&mut self, decrypted: &[u8], srtcp_index: usize, ssrc: u32) -> Result<Bytes> {
        let iv = self.rtcp_initialization_vector(srtcp_index, ssrc);
        let aad = self.rtcp_additional_authenticated_data(decrypted, srtcp_index);

        let encrypted_data = self.srtcp_cipher.encrypt(
            &iv,
            Payload {
                msg: &decrypted[HEADER_LENGTH + SSRC_LENGTH..],
                aad: &aad,
            },
        )?;

        let mut writer = BytesMut::with_capacity(encrypted_data.len() + aad.len());
        writer.extend_from_slice(&decrypted[..HEADER_LENGTH + SSRC_LENGTH]);
        writer.extend(encrypted_data);
        writer.extend_from_slice(&aad[HEADER_LENGTH + SSRC_LENGTH..]);

        Ok(writer.freeze())
    }

    fn decrypt_rtcp(&mut self, encrypted: &[u8], srtcp_index: usize, ssrc: u32) -> Result<Bytes> {
        let min_len = HEADER_LENGTH + SSRC_LENGTH + self.aead_auth_tag_len() + SRTCP_INDEX_SIZE;
        if encrypted.len() < min_len {
            return Err(Error::SrtcpTooSmall(encrypted.len(), min_len));
        }

        let nonce = self.rtcp_initialization_vector(srtcp_index, ssrc);
        let aad = self.rtcp_additional_authenticated_data(encrypted, srtcp_index);
        let body = &encrypted[HEADER_LENGTH + SSRC_LENGTH..(encrypted.len() - SRTCP_INDEX_SIZE)];

        let decrypted_data = self
            .srtcp_cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: body,
                    aad: &aad,
                },
            )
            .map_err(|_| Error::RtcpFailedToVerifyAuthTag)?;

        let mut writer =
            BytesMut::with_capacity(HEADER_LENGTH + SSRC_LENGTH + decrypted_data.len());
        writer.extend_from_slice(&encrypted[..HEADER_LENGTH + SSRC_LENGTH]);
        writer.extend(decrypted_data);

        Ok(writer.freeze())
    }
}

impl CipherAeadAesGcm {
    /// Create a new AEAD instance.
    pub(crate) fn new(
        profile: ProtectionProfile,
        master_key: &[u8],
        master_salt: &[u8],
    ) -> Result<CipherAeadAesGcm> {
        if master_salt.len() != profile.salt_len() {
            return Err(Error::SrtpSaltLength(profile.salt_len(), master_salt.len()));
        }

        let kdf: Kdf = match profile {
            // AES_256_GCM must use AES_256_CM_PRF as per https://datatracker.ietf.org/doc/html/rfc7714#section-11
            ProtectionProfile::AeadAes256Gcm => aes_256_cm_key_derivation,
            _ => aes_cm_key_derivation,
        };

        let srtp_session_key = kdf(
            LABEL_SRTP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;
        let srtp_cipher = GcmInstance::new(profile, &srtp_session_key)?;

        let srtcp_session_key = kdf(
            LABEL_SRTCP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;
        let srtcp_cipher = GcmInstance::new(profile, &srtcp_session_key)?;

        let srtp_session_salt = kdf(
            LABEL_SRTP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;

        let srtcp_session_salt = kdf(
            LABEL_SRTCP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;

        Ok(CipherAeadAesGcm {
            profile,
            srtp_cipher,
            srtcp_cipher,
            srtp_session_salt,
            srtcp_session_salt,
        })
    }

    /// The 12-octet IV used by AES-GCM SRTP is formed by first concatenating
    /// 2 octets of zeroes, the 4-octet SSRC, the 4-octet rollover counter
    /// (ROC), and the 2-octet sequence number (SEQ).  The resulting 12-octet
    /// value is then XORed to the 12-octet salt to form the 12-octet IV.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-8.1
    pub(crate) fn rtp_initialization_vector(
        &self,
        header: &rtp::header::Header,
        roc: u32,
    ) -> [u8; AEAD_IV_LEN] {
        let mut iv = [0u8; AEAD_IV_LEN];
        BigEndian::write_u32(&mut iv[2..], header.ssrc);
        BigEndian::write_u32(&mut iv[6..], roc);
        BigEndian::write_u16(&mut iv[10..], header.sequence_number);

        for (v, s) in iv.iter_mut().zip(&self.srtp_session_salt) {
            *v ^= s;
        }

        iv
    }

    /// The 12-octet IV used by AES-GCM SRTCP is formed by first
    /// concatenating 2 octets of zeroes, the 4-octet SSRC identifier,
    /// 2 octets of zeroes, a single "0" bit, and the 31-bit SRTCP index.
    /// The resulting 12-octet value is then XORed to the 12-octet salt to
    /// form the 12-octet IV.
    ///
    /// https://tools.ietf.org/html/rfc7714#section-9.1
    pub(crate) fn rtcp_initialization_vector(
        &self,
        srtcp_index: usize,
        ssrc: u32,
    ) -> [u8; AEAD_IV_LEN] {
        let mut iv = [0u8; AEAD_IV_LEN];

        BigEndian::write_u32(&mut iv[2..], ssrc);
        BigEndian::write_u32(&mut iv[8..], srtcp_index as u32);

        for (v, s) in iv.iter_mut().zip(&self.srtcp_session_salt) {
            *v ^= s;
        }

        iv
    }

    /// In an SRTCP packet, a 1-bit Encryption flag is prepended to the
    /// 31-bit SRTCP index to form a 32-bit value we shall call the
    /// "ESRTCP word"
    ///
    /// https://tools.ietf.org/html/rfc7714#section-17
    pub(crate) fn rtcp_additional_authenticated_data(
        &self,
        rtcp_packet: &[u8],
        srtcp_index: usize,
    ) -> [u8; 12] {
        let mut aad = [0u8; 12];

        aad[..8].copy_from_slice(&rtcp_packet[..8]);

        BigEndian::write_u32(&mut aad[8..], srtcp_index as u32);

        aad[8] |= RTCP_ENCRYPTION_FLAG;
        aad
    }
}
