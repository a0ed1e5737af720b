use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes};
use hmac::{Hmac, Mac};
use rtcp::header::{HEADER_LENGTH, SSRC_LENGTH};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use util::marshal::*;

use super::Cipher;
use crate::context::SRTCP_INDEX_SIZE;
use crate::error::{Error, Result};
use crate::key_derivation::*;
use crate::protection_profile::ProtectionProfile;

type HmacSha1 = Hmac<Sha1>;
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

pub(crate) struct CipherAesCmHmacSha1 {
    profile: ProtectionProfile,
    srtp_session_key: Vec<u8>,
    srtp_session_salt: Vec<u8>,
    srtp_session_auth_key: Vec<u8>,
    srtp_session_auth: HmacSha1,
    srtcp_session_key: Vec<u8>,
    srtcp_session_salt: Vec<u8>,
    srtcp_session_auth: HmacSha1,
    external_auth: bool,
}

impl CipherAesCmHmacSha1 {
    pub fn new(profile: ProtectionProfile, master_key: &[u8], master_salt: &[u8]) -> Result<Self> {
        let srtp_session_key = aes_cm_key_derivation(
            LABEL_SRTP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;
        let srtcp_session_key = aes_cm_key_derivation(
            LABEL_SRTCP_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;

        let srtp_session_salt = aes_cm_key_derivation(
            LABEL_SRTP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;
        let srtcp_session_salt = aes_cm_key_derivation(
            LABEL_SRTCP_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;

        let auth_key_len = profile.auth_key_len();

        let srtp_session_auth_key = aes_cm_key_derivation(
            LABEL_SRTP_AUTHENTICATION_TAG,
            master_key,
            master_salt,
            0,
            auth_key_len,
        )?;
        let srtcp_session_auth_key = aes_cm_key_derivation(
            LABEL_SRTCP_AUTHENTICATION_TAG,
            master_key,
            master_salt,
            0,
            auth_key_len,
        )?;

        let srtp_session_auth = HmacSha1::new_from_slice(&srtp_session_auth_key)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        let srtcp_session_auth = HmacSha1::new_from_slice(&srtcp_session_auth_key)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        Ok(CipherAesCmHmacSha1 {
            profile,
            srtp_session_key,
            srtp_session_salt,
            srtp_session_auth_key,
            srtp_session_auth,
            srtcp_session_key,
            srtcp_session_salt,
            srtcp_session_auth,
            external_auth: false,
        })
    }

    /// https://tools.ietf.org/html/rfc3711#section-4.2
    /// In the case of SRTP, M SHALL consist of the Authenticated
    /// Portion of the packet (as specified in Figure 1) concatenated with
    /// the roc, M = Authenticated Portion || roc;
    ///
    /// The pre-defined authentication transform for SRTP is HMAC-SHA1
    /// [RFC2104].  With HMAC-SHA1, the SRTP_PREFIX_LENGTH (Figure 3) SHALL
    /// be 0.  For SRTP (respectively SRTCP), the HMAC SHALL be applied to
    /// the session authentication key and M as specified above, i.e.,
    /// HMAC(k_a, M).  The HMAC output SHALL then be truncated to the n_tag
    /// left-most bits.
    fn generate_srtp_auth_tag(&self, buf: &[u8], roc: u32) -> [u8; 20] {
        let mut signer = self.srtp_session_auth.clone();

        signer.update(buf);

        // For SRTP only, we need to hash the rollover counter as well.
        signer.update(&roc.to_be_bytes());

        signer.finalize().into_bytes().into()
    }

    fn generate_srtcp_auth_tag(&self, buf: &[u8]) -> [u8; 20] {
        let mut signer = self.srtcp_session_auth.clone();

        signer.update(buf);

        signer.finalize().into_bytes().into()
    }

    fn apply_keystream(key: &[u8], counter: &[u8; 16], buf: &mut [u8]) {
        let key = GenericArray::from_slice(key);
        let nonce = GenericArray::from_slice(counter);
        let mut stream = Aes128Ctr::new(key, nonce);
        stream.apply_keystream(buf);
    }
}

impl Cipher for CipherAesCmHmacSha1 {
    fn rtp_auth_tag_len(&self) -> usize {
        self.profile.rtp_auth_tag_len()
    }

    fn rtcp_auth_tag_len(&self) -> usize {
        self.profile.rtcp_auth_tag_len()
    }

    fn aead_auth_tag_len(&self) -> usize {
        self.profile.aead_auth_tag_len()
    }

    fn rtcp_index(&self, input: &[u8]) -> usize {
        let tail_offset = input.len() - (self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE);
        (BigEndian::read_u32(&input[tail_offset..tail_offset + SRTCP_INDEX_SIZE]) & !(1 << 31))
            as usize
    }

    fn rtp_auth_key(&self) -> Option<&[u8]> {
        Some(&self.srtp_session_auth_key)
    }

    fn enable_external_auth(&mut self) -> bool {
        self.external_auth = true;
        true
    }

    fn encrypt_rtp(
        &mut self,
        plaintext: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let mut writer = Vec::with_capacity(plaintext.len() + self.rtp_auth_tag_len());

        // Write the plaintext to the destination buffer.
        writer.extend_from_slice(plaintext);

        // Encrypt the payload
        let counter = generate_counter(
            header.sequence_number,
            roc,
            header.ssrc,
            &self.srtp_session_salt,
        );
        Self::apply_keystream(
            &self.srtp_session_key,
            &counter,
            &mut writer[header.marshal_size()..],
        );

        if self.external_auth {
            // Room for the tag, written later by whoever owns the auth key.
            writer.resize(writer.len() + self.rtp_auth_tag_len(), 0);
        } else {
            let auth_tag = &self.generate_srtp_auth_tag(&writer, roc)[..self.rtp_auth_tag_len()];
            writer.extend_from_slice(auth_tag);
        }

        Ok(Bytes::from(writer))
    }

    fn decrypt_rtp(
        &mut self,
        encrypted: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes> {
        let encrypted_len = encrypted.len();
        let header_len = header.marshal_size();
        if encrypted_len < header_len + self.rtp_auth_tag_len() {
            return Err(Error::SrtpTooSmall(
                encrypted_len,
                header_len + self.rtp_auth_tag_len(),
            ));
        }

        // Split the auth tag and the cipher text into two parts.
        let actual_tag = &encrypted[encrypted_len - self.rtp_auth_tag_len()..];
        let cipher_text = &encrypted[..encrypted_len - self.rtp_auth_tag_len()];

        // Generate the auth tag we expect to see from the ciphertext.
        let expected_tag =
            &self.generate_srtp_auth_tag(cipher_text, roc)[..self.rtp_auth_tag_len()];

        // See if the auth tag actually matches.
        // We use a constant time comparison to prevent timing attacks.
        if actual_tag.ct_eq(expected_tag).unwrap_u8() != 1 {
            return Err(Error::RtpFailedToVerifyAuthTag);
        }

        let mut writer = cipher_text.to_vec();

        // Decrypt the ciphertext for the payload.
        let counter = generate_counter(
            header.sequence_number,
            roc,
            header.ssrc,
            &self.srtp_session_salt,
        );
        Self::apply_keystream(&self.srtp_session_key, &counter, &mut writer[header_len..]);

        Ok(Bytes::from(writer))
    }

    fn encrypt_rtcp(&mut self, decrypted: &[u8], srtcp_index: usize, ssrc: u32) -> Result<Bytes> {
        let mut writer =
            Vec::with_capacity(decrypted.len() + SRTCP_INDEX_SIZE + self.rtcp_auth_tag_len());

        // Write the decrypted to the destination buffer.
        writer.extend_from_slice(decrypted);

        // Encrypt everything after header
        let counter = generate_counter(
            (srtcp_index & 0xFFFF) as u16,
            (srtcp_index >> 16) as u32,
            ssrc,
            &self.srtcp_session_salt,
        );
        Self::apply_keystream(
            &self.srtcp_session_key,
            &counter,
            &mut writer[HEADER_LENGTH + SSRC_LENGTH..],
        );

        // Add SRTCP index and set Encryption bit
        writer.put_u32(srtcp_index as u32 | (1u32 << 31));

        // Generate the auth tag.
        let auth_tag = &self.generate_srtcp_auth_tag(&writer)[..self.rtcp_auth_tag_len()];
        writer.extend_from_slice(auth_tag);

        Ok(Bytes::from(writer))
    }

    fn decrypt_rtcp(&mut self, encrypted: &[u8], srtcp_index: usize, ssrc: u32) -> Result<Bytes> {
        let encrypted_len = encrypted.len();
        if encrypted_len < HEADER_LENGTH + SSRC_LENGTH + self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE
        {
            return Err(Error::SrtcpTooSmall(
                encrypted_len,
                HEADER_LENGTH + SSRC_LENGTH + self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE,
            ));
        }

        let tail_offset = encrypted_len - (self.rtcp_auth_tag_len() + SRTCP_INDEX_SIZE);

        // Split the auth tag and the cipher text into two parts.
        let actual_tag = &encrypted[encrypted_len - self.rtcp_auth_tag_len()..];
        let cipher_text = &encrypted[..encrypted_len - self.rtcp_auth_tag_len()];

        // The tag covers the E flag too, so it is checked before trusting it.
        let expected_tag = &self.generate_srtcp_auth_tag(cipher_text)[..self.rtcp_auth_tag_len()];
        if actual_tag.ct_eq(expected_tag).unwrap_u8() != 1 {
            return Err(Error::RtcpFailedToVerifyAuthTag);
        }

        let mut writer = encrypted[..tail_offset].to_vec();

        let is_encrypted = encrypted[tail_offset] >> 7;
        if is_encrypted == 0 {
            return Ok(Bytes::from(writer));
        }

        let counter = generate_counter(
            (srtcp_index & 0xFFFF) as u16,
            (srtcp_index >> 16) as u32,
            ssrc,
            &self.srtcp_session_salt,
        );
        Self::apply_keystream(
            &self.srtcp_session_key,
            &counter,
            &mut writer[HEADER_LENGTH + SSRC_LENGTH..],
        );

        Ok(Bytes::from(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_cipher(profile: ProtectionProfile) -> CipherAesCmHmacSha1 {
        CipherAesCmHmacSha1::new(profile, &[0x11; 16], &[0x22; 14]).unwrap()
    }

    #[test]
    fn test_aes_cm_hmac_sha1_32_tag_len() {
        let mut cipher = build_cipher(ProtectionProfile::Aes128CmHmacSha1_32);
        let header = rtp::header::Header {
            version: 2,
            ssrc: 0xcafe,
            sequence_number: 7,
            ..Default::default()
        };
        let mut plaintext = header.marshal().unwrap().to_vec();
        plaintext.extend_from_slice(&[0xab; 20]);

        let encrypted = cipher.encrypt_rtp(&plaintext, &header, 0).unwrap();
        assert_eq!(encrypted.len(), plaintext.len() + 4);

        let decrypted = cipher.decrypt_rtp(&encrypted, &header, 0).unwrap();
        assert_eq!(&decrypted[..], &plaintext[..]);
    }

    #[test]
    fn test_external_auth_leaves_tag_to_caller() {
        let mut cipher = build_cipher(ProtectionProfile::Aes128CmHmacSha1_80);
        assert!(cipher.enable_external_auth());
        assert_eq!(cipher.rtp_auth_key().map(|k| k.len()), Some(20));

        let header = rtp::header::Header {
            version: 2,
            ssrc: 1,
            sequence_number: 1,
            ..Default::default()
        };
        let mut plaintext = header.marshal().unwrap().to_vec();
        plaintext.extend_from_slice(&[0x01; 8]);

        let encrypted = cipher.encrypt_rtp(&plaintext, &header, 0).unwrap();
        assert_eq!(encrypted.len(), plaintext.len() + 10);
        assert_eq!(&encrypted[encrypted.len() - 10..], &[0u8; 10]);
    }
}
