use std::sync::Arc;

use srtp::option::{srtcp_replay_protection, srtp_replay_protection, ContextOption};

use crate::cipher_suite::CryptoSuiteRegistry;

pub const DEFAULT_SRTP_REPLAY_PROTECTION_WINDOW: usize = 64;
pub const DEFAULT_SRTCP_REPLAY_PROTECTION_WINDOW: usize = 64;

/// Config is used to configure a filter.
/// After a Config is passed to a filter it must not be modified.
#[derive(Debug, Clone)]
pub struct Config {
    /// Replay checks on incoming packets. Outgoing contexts never track replay.
    pub replay_protection: bool,
    pub srtp_replay_window: usize,
    pub srtcp_replay_window: usize,
    pub registry: Arc<CryptoSuiteRegistry>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            replay_protection: true,
            srtp_replay_window: DEFAULT_SRTP_REPLAY_PROTECTION_WINDOW,
            srtcp_replay_window: DEFAULT_SRTCP_REPLAY_PROTECTION_WINDOW,
            registry: CryptoSuiteRegistry::shared(),
        }
    }
}

impl Config {
    /// Engine options for a receive context; `None` leaves replay
    /// protection off.
    pub(crate) fn recv_options(&self) -> (Option<ContextOption>, Option<ContextOption>) {
        if !self.replay_protection {
            return (None, None);
        }
        (
            Some(srtp_replay_protection(self.srtp_replay_window)),
            Some(srtcp_replay_protection(self.srtcp_replay_window)),
        )
    }
}
