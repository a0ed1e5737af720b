pub(crate) mod cipher_aead_aes_gcm;
pub(crate) mod cipher_aes_cm_hmac_sha1;

use bytes::Bytes;

use crate::error::Result;

/// Cipher is one SRTP transform, keyed with session keys already derived
/// from a master key.
///
/// SRTCP trailers differ between the two families. AES-CM puts the auth
/// tag after the E flag and index (`| hdr | payload | E+index | tag |`).
/// AEAD carries its tag inside the ciphertext, ahead of the index
/// (`| hdr | payload+tag | E+index |`), see RFC 7714 §9.
pub(crate) trait Cipher {
    fn rtp_auth_tag_len(&self) -> usize;
    fn rtcp_auth_tag_len(&self) -> usize;
    fn aead_auth_tag_len(&self) -> usize;

    /// SRTCP index of a protected packet, E flag masked off.
    fn rtcp_index(&self, input: &[u8]) -> usize;

    /// Session key authenticating outgoing RTP, for ciphers that have one.
    fn rtp_auth_key(&self) -> Option<&[u8]>;

    /// Leaves the RTP auth tag to the caller. Returns false when the
    /// cipher cannot authenticate externally.
    fn enable_external_auth(&mut self) -> bool;

    fn encrypt_rtp(
        &mut self,
        plaintext: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes>;

    fn decrypt_rtp(
        &mut self,
        ciphertext: &[u8],
        header: &rtp::header::Header,
        roc: u32,
    ) -> Result<Bytes>;

    fn encrypt_rtcp(&mut self, plaintext: &[u8], srtcp_index: usize, ssrc: u32) -> Result<Bytes>;

    fn decrypt_rtcp(&mut self, ciphertext: &[u8], srtcp_index: usize, ssrc: u32)
        -> Result<Bytes>;
}
