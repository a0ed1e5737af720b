
use parking_lot::Mutex;
use srtp::protection_profile::ProtectionProfile;

use crate::config::Config;
use crate::crypto_params::{CryptoParams, NegotiationRole};
use crate::error::{Error, Result};
use crate::key_params::{parse_key_params, MasterKey};
use crate::negotiation::{check_next_filter_state, select_proposal, FilterState, NegotiationOp};
use crate::session::{InstallOptions, SrtpSession};

/// Key and tag sizes a caller needs to compute RTP auth tags itself once
/// external auth is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpAuthParams {
    pub auth_key: Vec<u8>,
    pub key_len: usize,
    pub tag_len: usize,
}

/// SrtpFilter negotiates SDES crypto params through offer/answer and
/// protects or unprotects RTP and RTCP packets with the agreed keys.
///
/// All methods take `&self`; a filter may be shared between threads.
pub struct SrtpFilter {
    inner: Mutex<FilterInner>,
}

struct FilterInner {
    config: Config,
    state: FilterState,
    offer_params: Vec<CryptoParams>,

    rtp: SrtpSession,
    /// Set by `set_rtcp_params`; otherwise RTCP uses the RTP contexts.
    rtcp: Option<SrtpSession>,

    external_auth_enabled: bool,
    send_header_extension_ids: Vec<u8>,
    recv_header_extension_ids: Vec<u8>,
}

impl Default for SrtpFilter {
    fn default() -> Self {
        SrtpFilter::new()
    }
}

impl SrtpFilter {
    pub fn new() -> Self {
        SrtpFilter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        SrtpFilter {
            inner: Mutex::new(FilterInner {
                config,
                state: FilterState::Idle,
                offer_params: vec![],
                rtp: SrtpSession::default(),
                rtcp: None,
                external_auth_enabled: false,
                send_header_extension_ids: vec![],
                recv_header_extension_ids: vec![],
            }),
        }
    }

    pub fn state(&self) -> FilterState {
        self.inner.lock().state
    }

    /// Whether packets can be protected: keys were agreed by an answer
    /// (provisional or final) or installed directly, and remain usable
    /// while an updated offer is pending.
    pub fn is_active(&self) -> bool {
        self.inner.lock().state.is_active()
    }

    /// Records an offer. An empty list offers no crypto.
    pub fn set_offer(&self, params: &[CryptoParams], role: NegotiationRole) -> Result<()> {
        self.inner.lock().set_offer(params, role)
    }

    /// Accepts the final answer and installs its keys. An empty answer
    /// ends the session and leaves the filter inactive.
    pub fn set_answer(&self, params: &[CryptoParams], role: NegotiationRole) -> Result<()> {
        self.inner
            .lock()
            .set_answer(params, role, NegotiationOp::Answer)
    }

    /// Accepts a provisional answer. Keys in a non-empty answer are usable
    /// right away; the final answer may replace them.
    pub fn set_provisional_answer(
        &self,
        params: &[CryptoParams],
        role: NegotiationRole,
    ) -> Result<()> {
        self.inner
            .lock()
            .set_answer(params, role, NegotiationOp::ProvisionalAnswer)
    }

    /// Installs RTP keys directly, bypassing negotiation. Keys are
    /// `key || salt` sized for their profile. RTCP follows these keys unless
    /// [`SrtpFilter::set_rtcp_params`] is called. Fails once the filter is
    /// active.
    pub fn set_rtp_params(
        &self,
        send_suite: ProtectionProfile,
        send_key: &[u8],
        recv_suite: ProtectionProfile,
        recv_key: &[u8],
    ) -> Result<()> {
        self.inner
            .lock()
            .set_rtp_params(send_suite, send_key, recv_suite, recv_key)
    }

    /// Installs separate RTCP keys. Can be set only once, before or after
    /// [`SrtpFilter::set_rtp_params`].
    pub fn set_rtcp_params(
        &self,
        send_suite: ProtectionProfile,
        send_key: &[u8],
        recv_suite: ProtectionProfile,
        recv_key: &[u8],
    ) -> Result<()> {
        self.inner
            .lock()
            .set_rtcp_params(send_suite, send_key, recv_suite, recv_key)
    }

    /// Protects the RTP packet in `buf[..len]` in place. `buf.len()` is the
    /// capacity and must leave room for [`SrtpFilter::srtp_overhead`] bytes.
    pub fn protect_rtp(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.check_active()?;
        inner.rtp.protect_rtp(buf, len).map_err(|err| {
            log::trace!("failed to protect rtp packet of {len} bytes: {err}");
            err
        })
    }

    pub fn unprotect_rtp(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.check_active()?;
        inner.rtp.unprotect_rtp(buf, len).map_err(|err| {
            log::trace!("failed to unprotect rtp packet of {len} bytes: {err}");
            err
        })
    }

    /// Protects the RTCP packet in `buf[..len]` in place, appending the
    /// SRTCP index and auth tag.
    pub fn protect_rtcp(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.check_active()?;
        inner.rtcp_session().protect_rtcp(buf, len).map_err(|err| {
            log::trace!("failed to protect rtcp packet of {len} bytes: {err}");
            err
        })
    }

    pub fn unprotect_rtcp(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.check_active()?;
        inner.rtcp_session().unprotect_rtcp(buf, len).map_err(|err| {
            log::trace!("failed to unprotect rtcp packet of {len} bytes: {err}");
            err
        })
    }

    /// Bytes `protect_rtp` appends: the RTP auth tag length of the send
    /// suite.
    pub fn srtp_overhead(&self) -> Result<usize> {
        let inner = self.inner.lock();
        inner.check_active()?;
        inner
            .rtp
            .send()
            .map(|send| send.profile().rtp_overhead())
            .ok_or(Error::NotActive)
    }

    /// Asks for RTP auth tags to be left to the caller. Takes effect for send
    /// contexts installed afterwards and is ignored for AEAD suites.
    pub fn enable_external_auth(&self) {
        self.inner.lock().external_auth_enabled = true;
    }

    pub fn is_external_auth_enabled(&self) -> bool {
        self.inner.lock().external_auth_enabled
    }

    pub fn is_external_auth_active(&self) -> bool {
        self.inner
            .lock()
            .rtp
            .send()
            .map(|send| send.context().is_external_auth())
            .unwrap_or(false)
    }

    pub fn rtp_auth_params(&self) -> Result<RtpAuthParams> {
        let inner = self.inner.lock();
        inner.check_active()?;
        let send = inner.rtp.send().ok_or(Error::ExternalAuthInactive)?;
        let auth_key = send.context().rtp_auth_key()?.to_vec();

        Ok(RtpAuthParams {
            key_len: auth_key.len(),
            tag_len: send.profile().rtp_auth_tag_len(),
            auth_key,
        })
    }

    /// Selects the RTP header extension IDs encrypted on outgoing
    /// (`Local`) or incoming (`Remote`) packets. Applies to the live
    /// context right away and to every context installed later.
    pub fn set_encrypted_header_extension_ids(
        &self,
        role: NegotiationRole,
        ids: &[u8],
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let outgoing = role == NegotiationRole::Local;
        inner.rtp.set_encrypted_header_extension_ids(outgoing, ids)?;

        if outgoing {
            inner.send_header_extension_ids = ids.to_vec();
        } else {
            inner.recv_header_extension_ids = ids.to_vec();
        }
        log::debug!("encrypted header extension ids for {role} packets: {ids:?}");
        Ok(())
    }
}

impl FilterInner {
    fn check_active(&self) -> Result<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(Error::NotActive)
        }
    }

    fn rtcp_session(&mut self) -> &mut SrtpSession {
        match self.rtcp.as_mut() {
            Some(rtcp) => rtcp,
            None => &mut self.rtp,
        }
    }

    fn install_options(&self) -> InstallOptions<'_> {
        InstallOptions {
            config: &self.config,
            send_header_extension_ids: &self.send_header_extension_ids,
            recv_header_extension_ids: &self.recv_header_extension_ids,
            external_auth: self.external_auth_enabled,
        }
    }

    fn transition(&mut self, next: FilterState) {
        if self.state != next {
            log::debug!("srtp filter state {} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn set_offer(&mut self, params: &[CryptoParams], role: NegotiationRole) -> Result<()> {
        let next = check_next_filter_state(
            self.state,
            NegotiationOp::Offer,
            role,
            !params.is_empty(),
        )
        .map_err(|err| {
            log::warn!("rejected srtp offer: {err}");
            err
        })?;

        self.offer_params = params.to_vec();
        self.transition(next);
        Ok(())
    }

    fn set_answer(
        &mut self,
        params: &[CryptoParams],
        role: NegotiationRole,
        op: NegotiationOp,
    ) -> Result<()> {
        self.apply_answer(params, role, op).map_err(|err| {
            log::warn!("rejected srtp {op}: {err}");
            err
        })
    }

    fn apply_answer(
        &mut self,
        params: &[CryptoParams],
        role: NegotiationRole,
        op: NegotiationOp,
    ) -> Result<()> {
        let next = check_next_filter_state(self.state, op, role, !params.is_empty())?;

        if params.is_empty() {
            if next == FilterState::Idle {
                self.reset();
            } else {
                self.transition(next);
            }
            return Ok(());
        }

        let selected = select_proposal(&self.offer_params, params)?;
        let answer = &params[0];
        let (send_params, recv_params) = match role {
            NegotiationRole::Remote => (selected, answer),
            NegotiationRole::Local => (answer, selected),
        };
        let send = self.master_key(send_params)?;
        let recv = self.master_key(recv_params)?;

        let prepared = self.rtp.prepare(send, recv, &self.install_options())?;
        self.rtp.commit(prepared);

        if op == NegotiationOp::Answer {
            self.offer_params.clear();
        }
        self.transition(next);
        Ok(())
    }

    fn master_key(&self, params: &CryptoParams) -> Result<MasterKey> {
        let profile = self
            .config
            .registry
            .profile_by_name(&params.cipher_suite)
            .ok_or_else(|| Error::UnsupportedCipherSuite(params.cipher_suite.clone()))?;
        parse_key_params(&params.key_params, profile)
    }

    fn set_rtp_params(
        &mut self,
        send_suite: ProtectionProfile,
        send_key: &[u8],
        recv_suite: ProtectionProfile,
        recv_key: &[u8],
    ) -> Result<()> {
        if self.state.is_active() {
            log::error!("tried to set srtp params when filter already active");
            return Err(Error::IllegalTransition(format!(
                "rtp params in state {}",
                self.state
            )));
        }

        // Wrongly sized keys are split as given and rejected by the engine.
        let prepared = self.rtp.prepare(
            MasterKey::from_concatenated(send_suite, send_key),
            MasterKey::from_concatenated(recv_suite, recv_key),
            &self.install_options(),
        )?;
        self.rtp.commit(prepared);
        self.offer_params.clear();
        self.transition(FilterState::Active);

        log::info!(
            "srtp activated with rtp params: send suite {send_suite:?} recv suite {recv_suite:?}"
        );
        Ok(())
    }

    fn set_rtcp_params(
        &mut self,
        send_suite: ProtectionProfile,
        send_key: &[u8],
        recv_suite: ProtectionProfile,
        recv_key: &[u8],
    ) -> Result<()> {
        if self.rtcp.is_some() {
            log::error!("tried to set srtcp params when already set");
            return Err(Error::IllegalTransition(
                "rtcp params already set".to_owned(),
            ));
        }

        let options = InstallOptions {
            config: &self.config,
            send_header_extension_ids: &[],
            recv_header_extension_ids: &[],
            external_auth: false,
        };
        let mut rtcp = SrtpSession::default();
        // Wrongly sized keys are split as given and rejected by the engine.
        let prepared = rtcp.prepare(
            MasterKey::from_concatenated(send_suite, send_key),
            MasterKey::from_concatenated(recv_suite, recv_key),
            &options,
        )?;
        rtcp.commit(prepared);
        self.rtcp = Some(rtcp);

        log::info!(
            "srtcp activated with rtcp params: send suite {send_suite:?} recv suite {recv_suite:?}"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.offer_params.clear();
        self.rtp = SrtpSession::default();
        self.rtcp = None;
        self.transition(FilterState::Idle);
        log::info!("srtp reset to idle state");
    }
}
