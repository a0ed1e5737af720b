use std::fmt;

/// One `a=crypto` proposal (RFC 4568): a tag, a suite name and SDES key
/// params of the form `inline:<base64 key||salt>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CryptoParams {
    pub tag: u32,
    pub cipher_suite: String,
    pub key_params: String,
    pub session_params: String,
}

impl CryptoParams {
    pub fn new(tag: u32, cipher_suite: &str, key_params: &str) -> Self {
        CryptoParams {
            tag,
            cipher_suite: cipher_suite.to_owned(),
            key_params: key_params.to_owned(),
            session_params: String::new(),
        }
    }

    /// An answer entry accepts an offer entry when both tag and suite agree.
    pub fn matches(&self, other: &CryptoParams) -> bool {
        self.tag == other.tag && self.cipher_suite == other.cipher_suite
    }
}

/// Which side of the offer/answer exchange supplied a params list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NegotiationRole {
    Local,
    Remote,
}

impl NegotiationRole {
    pub fn opposite(self) -> Self {
        match self {
            NegotiationRole::Local => NegotiationRole::Remote,
            NegotiationRole::Remote => NegotiationRole::Local,
        }
    }
}

impl fmt::Display for NegotiationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            NegotiationRole::Local => "local",
            NegotiationRole::Remote => "remote",
        };
        write!(f, "{s}")
    }
}
