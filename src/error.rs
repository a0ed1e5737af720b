use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Key params do not start with `inline:` or are not valid base64.
    #[error("bad key params encoding: {0}")]
    BadEncoding(String),
    #[error("key material must be {expected} bytes, got {actual}")]
    KeyLengthMismatch { expected: usize, actual: usize },
    /// Lifetime or MKI suffix on key params.
    #[error("unsupported key params option: {0}")]
    UnsupportedOption(String),
    #[error("unsupported cipher suite: {0}")]
    UnsupportedCipherSuite(String),
    #[error("answer does not match any offered crypto params")]
    NoMatchingProposal,
    #[error("answer must carry exactly one crypto params entry, got {0}")]
    TooManyAnswerParams(usize),
    #[error("illegal negotiation transition: {0}")]
    IllegalTransition(String),
    #[error("srtp engine rejected keys: {0}")]
    EngineRejected(String),

    #[error("buffer too small: need {needed} bytes, capacity {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("failed to authenticate packet")]
    AuthenticationFailed,
    #[error("replayed packet")]
    ReplayDetected,
    #[error("rollover counter or srtcp index exhausted, rekey required")]
    SequenceExhausted,
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("encrypted header extensions are not supported with {0}")]
    UnsupportedWithSuite(String),
    #[error("srtp filter is not active")]
    NotActive,
    #[error("external authentication is not active")]
    ExternalAuthInactive,
}

impl From<srtp::Error> for Error {
    fn from(e: srtp::Error) -> Self {
        match e {
            srtp::Error::RtpFailedToVerifyAuthTag | srtp::Error::RtcpFailedToVerifyAuthTag => {
                Error::AuthenticationFailed
            }
            srtp::Error::SrtpSsrcDuplicated(..) | srtp::Error::SrtcpSsrcDuplicated(..) => {
                Error::ReplayDetected
            }
            srtp::Error::SrtpRolloverExhausted(_) | srtp::Error::SrtcpIndexExhausted(_) => {
                Error::SequenceExhausted
            }
            srtp::Error::SrtpTooSmall(..)
            | srtp::Error::SrtcpTooSmall(..)
            | srtp::Error::ErrTooShortRtcp
            | srtp::Error::HeaderExtensionTruncated
            | srtp::Error::Util(_) => Error::MalformedPacket(e.to_string()),
            srtp::Error::HeaderExtensionsUnsupportedWithAead => {
                Error::UnsupportedWithSuite("AEAD cipher suites".to_owned())
            }
            srtp::Error::ExternalAuthNotEnabled => Error::ExternalAuthInactive,
            other => Error::EngineRejected(other.to_string()),
        }
    }
}
