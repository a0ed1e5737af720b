use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use rtcp::header::{HEADER_LENGTH, SSRC_LENGTH};
use util::marshal::*;

use super::*;
use crate::error::Result;

impl Context {
    /// DecryptRTCP decrypts a buffer that contains a RTCP packet
    pub fn decrypt_rtcp(&mut self, encrypted: &[u8]) -> Result<Bytes> {
        let min_len = HEADER_LENGTH
            + SSRC_LENGTH
            + SRTCP_INDEX_SIZE
            + self.cipher.rtcp_auth_tag_len()
            + self.cipher.aead_auth_tag_len();
        if encrypted.len() < min_len {
            return Err(Error::SrtcpTooSmall(encrypted.len(), min_len));
        }

        let mut buf = encrypted;
        rtcp::header::Header::unmarshal(&mut buf)?;

        let index = self.cipher.rtcp_index(encrypted);
        let ssrc = BigEndian::read_u32(&encrypted[HEADER_LENGTH..]);

        {
            let state = self.get_srtcp_ssrc_state(ssrc);
            if let Some(replay_detector) = &mut state.replay_detector {
                if !replay_detector.check(index as u64) {
                    return Err(Error::SrtcpSsrcDuplicated(ssrc, index));
                }
            }
        }

        let dst = self.cipher.decrypt_rtcp(encrypted, index, ssrc)?;

        {
            let state = self.get_srtcp_ssrc_state(ssrc);
            if let Some(replay_detector) = &mut state.replay_detector {
                replay_detector.accept();
            }
        }

        Ok(dst)
    }

    /// EncryptRTCP encrypts a buffer that contains a RTCP packet. The
    /// result is `decrypted.len() + profile.rtcp_overhead()` bytes long.
    pub fn encrypt_rtcp(&mut self, decrypted: &[u8]) -> Result<Bytes> {
        if decrypted.len() < HEADER_LENGTH + SSRC_LENGTH {
            return Err(Error::ErrTooShortRtcp);
        }

        let mut buf = decrypted;
        rtcp::header::Header::unmarshal(&mut buf)?;

        let ssrc = BigEndian::read_u32(&decrypted[HEADER_LENGTH..]);

        let index = {
            let state = self.get_srtcp_ssrc_state(ssrc);
            // The index never wraps, a new master key is needed instead.
            if state.srtcp_index >= MAX_SRTCP_INDEX {
                return Err(Error::SrtcpIndexExhausted(ssrc));
            }
            state.srtcp_index += 1;
            state.srtcp_index
        };

        self.cipher.encrypt_rtcp(decrypted, index, ssrc)
    }
}
