
use std::ops::Range;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::key_derivation::*;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

const RTP_FIXED_HEADER_LEN: usize = 12;
const CSRC_LEN: usize = 4;
const EXTENSION_HEADER_LEN: usize = 4;
const EXTENSION_BIT: u8 = 0x10;
const CC_MASK: u8 = 0x0F;
const EXTENSION_PROFILE_ONE_BYTE: u16 = 0xBEDE;
const EXTENSION_PROFILE_TWO_BYTE: u16 = 0x1000;
const EXTENSION_PROFILE_TWO_BYTE_MASK: u16 = 0xFFF0;
const EXTENSION_ID_RESERVED: u8 = 0xF;

/// Extension data bytes selected for encryption, located inside a raw
/// RTP packet.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ExtensionLayout {
    /// Extension body, after the 4-byte profile/length word.
    pub body: Range<usize>,
    /// Data bytes of the selected elements. ID and length bytes are never
    /// included.
    pub elements: Vec<Range<usize>>,
}

/// Walks the RFC 8285 header extension of `packet` and returns the data
/// ranges of the elements whose ID is in `ids`. Packets without an
/// extension, or with a profile other than one-byte/two-byte, yield
/// `None`.
pub(crate) fn locate_encrypted_elements(
    packet: &[u8],
    ids: &[u8],
) -> Result<Option<ExtensionLayout>> {
    if packet.len() < RTP_FIXED_HEADER_LEN {
        return Err(Error::HeaderExtensionTruncated);
    }
    if packet[0] & EXTENSION_BIT == 0 {
        return Ok(None);
    }

    let offset = RTP_FIXED_HEADER_LEN + (packet[0] & CC_MASK) as usize * CSRC_LEN;
    if packet.len() < offset + EXTENSION_HEADER_LEN {
        return Err(Error::HeaderExtensionTruncated);
    }

    let profile = BigEndian::read_u16(&packet[offset..]);
    let body_len = BigEndian::read_u16(&packet[offset + 2..]) as usize * 4;
    let body = offset + EXTENSION_HEADER_LEN..offset + EXTENSION_HEADER_LEN + body_len;
    if packet.len() < body.end {
        return Err(Error::HeaderExtensionTruncated);
    }

    let elements = if profile == EXTENSION_PROFILE_ONE_BYTE {
        one_byte_elements(packet, body.clone(), ids)?
    } else if profile & EXTENSION_PROFILE_TWO_BYTE_MASK == EXTENSION_PROFILE_TWO_BYTE {
        two_byte_elements(packet, body.clone(), ids)?
    } else {
        return Ok(None);
    };

    Ok(Some(ExtensionLayout { body, elements }))
}

// RFC 8285 section 4.2
fn one_byte_elements(packet: &[u8], body: Range<usize>, ids: &[u8]) -> Result<Vec<Range<usize>>> {
    let mut elements = vec![];
    let mut pos = body.start;
    while pos < body.end {
        let b = packet[pos];
        if b == 0x00 {
            // padding
            pos += 1;
            continue;
        }

        let id = b >> 4;
        let len = (b & 0x0F) as usize + 1;
        if id == EXTENSION_ID_RESERVED {
            break;
        }

        pos += 1;
        if pos + len > body.end {
            return Err(Error::HeaderExtensionTruncated);
        }
        if ids.contains(&id) {
            elements.push(pos..pos + len);
        }
        pos += len;
    }

    Ok(elements)
}

// RFC 8285 section 4.3
fn two_byte_elements(packet: &[u8], body: Range<usize>, ids: &[u8]) -> Result<Vec<Range<usize>>> {
    let mut elements = vec![];
    let mut pos = body.start;
    while pos + 1 < body.end {
        let id = packet[pos];
        if id == 0x00 {
            pos += 1;
            continue;
        }

        let len = packet[pos + 1] as usize;
        pos += 2;
        if pos + len > body.end {
            return Err(Error::HeaderExtensionTruncated);
        }
        if len > 0 && ids.contains(&id) {
            elements.push(pos..pos + len);
        }
        pos += len;
    }

    Ok(elements)
}

/// Encrypts selected RTP header extension elements as described in
/// RFC 6904. The keystream is AES-CM under the header encryption key and
/// salt, started at the same packet index as the payload keystream.
/// Applying it twice restores the plaintext.
pub(crate) struct HeaderExtensionCipher {
    session_key: Vec<u8>,
    session_salt: Vec<u8>,
    ids: Vec<u8>,
}

impl HeaderExtensionCipher {
    pub(crate) fn new(master_key: &[u8], master_salt: &[u8], ids: &[u8]) -> Result<Self> {
        let session_key = aes_cm_key_derivation(
            LABEL_SRTP_HEADER_ENCRYPTION,
            master_key,
            master_salt,
            0,
            master_key.len(),
        )?;
        let session_salt = aes_cm_key_derivation(
            LABEL_SRTP_HEADER_SALT,
            master_key,
            master_salt,
            0,
            master_salt.len(),
        )?;

        Ok(HeaderExtensionCipher {
            session_key,
            session_salt,
            ids: ids.to_vec(),
        })
    }

    pub(crate) fn ids(&self) -> &[u8] {
        &self.ids
    }

    /// XORs the keystream into the selected element data of `packet` in
    /// place.
    pub(crate) fn apply(
        &self,
        packet: &mut [u8],
        sequence_number: u16,
        roc: u32,
        ssrc: u32,
    ) -> Result<()> {
        let layout = match locate_encrypted_elements(packet, &self.ids)? {
            Some(layout) if !layout.elements.is_empty() => layout,
            _ => return Ok(()),
        };

        let counter = generate_counter(sequence_number, roc, ssrc, &self.session_salt);
        let mut keystream = vec![0u8; layout.body.len()];
        let mut stream = Aes128Ctr::new(
            GenericArray::from_slice(&self.session_key),
            GenericArray::from_slice(&counter),
        );
        stream.apply_keystream(&mut keystream);

        for element in layout.elements {
            for i in element {
                packet[i] ^= keystream[i - layout.body.start];
            }
        }

        Ok(())
    }
}
