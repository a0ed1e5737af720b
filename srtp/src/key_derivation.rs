
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

pub(crate) const LABEL_SRTP_ENCRYPTION: u8 = 0x00;
pub(crate) const LABEL_SRTP_AUTHENTICATION_TAG: u8 = 0x01;
pub(crate) const LABEL_SRTP_SALT: u8 = 0x02;
pub(crate) const LABEL_SRTCP_ENCRYPTION: u8 = 0x03;
pub(crate) const LABEL_SRTCP_AUTHENTICATION_TAG: u8 = 0x04;
pub(crate) const LABEL_SRTCP_SALT: u8 = 0x05;
// RFC 6904 section 4.3
pub(crate) const LABEL_SRTP_HEADER_ENCRYPTION: u8 = 0x06;
pub(crate) const LABEL_SRTP_HEADER_SALT: u8 = 0x07;

const PRF_BLOCK_LEN: usize = 16;

/// Signature shared by the AES-128 and AES-256 PRFs.
pub(crate) type Kdf = fn(u8, &[u8], &[u8], usize, usize) -> Result<Vec<u8>>;

/// AES_CM PRF from https://tools.ietf.org/html/rfc3711#section-4.3.3
pub(crate) fn aes_cm_key_derivation(
    label: u8,
    master_key: &[u8],
    master_salt: &[u8],
    index_over_kdr: usize,
    out_len: usize,
) -> Result<Vec<u8>> {
    let block = Aes128::new_from_slice(master_key)
        .map_err(|_| Error::SrtpMasterKeyLength(16, master_key.len()))?;
    prf(&block, label, master_salt, index_over_kdr, out_len)
}

/// AES_256_CM_PRF, required for AEAD_AES_256_GCM by
/// https://datatracker.ietf.org/doc/html/rfc7714#section-11
pub(crate) fn aes_256_cm_key_derivation(
    label: u8,
    master_key: &[u8],
    master_salt: &[u8],
    index_over_kdr: usize,
    out_len: usize,
) -> Result<Vec<u8>> {
    let block = Aes256::new_from_slice(master_key)
        .map_err(|_| Error::SrtpMasterKeyLength(32, master_key.len()))?;
    prf(&block, label, master_salt, index_over_kdr, out_len)
}

fn prf<B: BlockEncrypt>(
    block: &B,
    label: u8,
    master_salt: &[u8],
    index_over_kdr: usize,
    out_len: usize,
) -> Result<Vec<u8>> {
    if index_over_kdr != 0 {
        // 24-bit "index DIV kdr" must be xored to prf input.
        return Err(Error::UnsupportedIndexOverKdr);
    }
    if master_salt.len() > PRF_BLOCK_LEN - 2 {
        return Err(Error::KeyDerivation(format!(
            "master salt of {} bytes does not fit the PRF input",
            master_salt.len()
        )));
    }

    // https://tools.ietf.org/html/rfc3711#appendix-B.3
    // The input block for AES-CM is generated by exclusive-oring the master salt with the
    // concatenation of the encryption key label 0x00 with (index DIV kdr),
    // - index is 'rollover count' and DIV is 'divided by'
    let mut prf_in = [0u8; PRF_BLOCK_LEN];
    prf_in[..master_salt.len()].copy_from_slice(master_salt);
    prf_in[7] ^= label;

    let blocks = out_len.div_ceil(PRF_BLOCK_LEN);
    let mut out = vec![0u8; blocks * PRF_BLOCK_LEN];
    for (i, chunk) in out.chunks_mut(PRF_BLOCK_LEN).enumerate() {
        BigEndian::write_u16(&mut prf_in[PRF_BLOCK_LEN - 2..], i as u16);
        chunk.copy_from_slice(&prf_in);
        block.encrypt_block(GenericArray::from_mut_slice(chunk));
    }

    out.truncate(out_len);
    Ok(out)
}

/// Generate IV https://tools.ietf.org/html/rfc3711#section-4.1.1
/// where the 128-bit integer value IV SHALL be defined by the SSRC, the
/// SRTP packet index i, and the SRTP session salting key k_s, as below.
/// ROC = a 32-bit unsigned rollover counter (roc), which records how many
/// times the 16-bit RTP sequence number has been reset to zero after
/// passing through 65,535
/// ```nobuild
/// i = 2^16 * roc + SEQ
/// IV = (salt*2 ^ 16) | (ssrc*2 ^ 64) | (i*2 ^ 16)
/// ```
pub(crate) fn generate_counter(
    sequence_number: u16,
    rollover_counter: u32,
    ssrc: u32,
    session_salt: &[u8],
) -> [u8; 16] {
    assert!(session_salt.len() <= 16);

    let mut counter = [0; 16];

    counter[4..8].copy_from_slice(&ssrc.to_be_bytes());
    counter[8..12].copy_from_slice(&rollover_counter.to_be_bytes());
    counter[12..16].copy_from_slice(&((sequence_number as u32) << 16).to_be_bytes());

    for (i, s) in session_salt.iter().enumerate() {
        counter[i] ^= s;
    }

    counter
}
