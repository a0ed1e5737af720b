use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("index_over_kdr > 0 is not supported yet")]
    UnsupportedIndexOverKdr,
    #[error("SRTP Master Key must be len {0}, got {1}")]
    SrtpMasterKeyLength(usize, usize),
    #[error("SRTP Salt must be len {0}, got {1}")]
    SrtpSaltLength(usize, usize),
    #[error("failed to derive session key: {0}")]
    KeyDerivation(String),

    #[error("srtp ssrc={0} index={1}: duplicated")]
    SrtpSsrcDuplicated(u32, u16),
    #[error("srtcp ssrc={0} index={1}: duplicated")]
    SrtcpSsrcDuplicated(u32, usize),
    #[error("srtp ssrc={0}: rollover counter exhausted")]
    SrtpRolloverExhausted(u32),
    #[error("srtcp ssrc={0}: index exhausted")]
    SrtcpIndexExhausted(u32),

    #[error("too short SRTP packet: only {0} bytes, expected > {1} bytes")]
    SrtpTooSmall(usize, usize),
    #[error("too short SRTCP packet: only {0} bytes, expected > {1} bytes")]
    SrtcpTooSmall(usize, usize),
    #[error("packet is too short to be rtcp packet")]
    ErrTooShortRtcp,
    #[error("rtp header extension exceeds packet length")]
    HeaderExtensionTruncated,

    #[error("failed to verify rtp auth tag")]
    RtpFailedToVerifyAuthTag,
    #[error("failed to verify rtcp auth tag")]
    RtcpFailedToVerifyAuthTag,

    #[error("encrypted header extensions are not supported with AEAD profiles")]
    HeaderExtensionsUnsupportedWithAead,
    #[error("external authentication is not enabled")]
    ExternalAuthNotEnabled,

    #[error("{0}")]
    Util(#[from] util::Error),
    #[error("aes gcm: {0}")]
    AesGcm(#[from] aes_gcm::Error),
}
