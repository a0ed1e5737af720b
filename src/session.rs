
use bytes::Bytes;
use srtp::context::Context;
use srtp::protection_profile::ProtectionProfile;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::key_params::MasterKey;

/// One direction of a session: the engine context and the key material it
/// was built from.
pub(crate) struct DirectionContext {
    master: MasterKey,
    context: Context,
}

impl DirectionContext {
    pub(crate) fn profile(&self) -> ProtectionProfile {
        self.master.profile
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }
}

/// What a new send/receive context needs beyond its keys.
pub(crate) struct InstallOptions<'a> {
    pub(crate) config: &'a Config,
    pub(crate) send_header_extension_ids: &'a [u8],
    pub(crate) recv_header_extension_ids: &'a [u8],
    pub(crate) external_auth: bool,
}

/// Contexts built by [`SrtpSession::prepare`]. `None` keeps the installed
/// context of that direction.
pub(crate) struct PreparedSession {
    send: Option<DirectionContext>,
    recv: Option<DirectionContext>,
}

/// SrtpSession owns the send and receive engine contexts of one stream
/// kind.
#[derive(Default)]
pub(crate) struct SrtpSession {
    send: Option<DirectionContext>,
    recv: Option<DirectionContext>,
}

impl SrtpSession {
    #[cfg(test)]
    pub(crate) fn is_installed(&self) -> bool {
        self.send.is_some() && self.recv.is_some()
    }

    pub(crate) fn send(&self) -> Option<&DirectionContext> {
        self.send.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn recv(&self) -> Option<&DirectionContext> {
        self.recv.as_ref()
    }

    /// Builds contexts for the directions whose key material differs from
    /// the installed one. Nothing is installed until [`SrtpSession::commit`].
    pub(crate) fn prepare(
        &self,
        send: MasterKey,
        recv: MasterKey,
        options: &InstallOptions<'_>,
    ) -> Result<PreparedSession> {
        let send = if self.send.as_ref().map(|d| &d.master) == Some(&send) {
            log::debug!("same srtp send keys applied again, keeping rollover state");
            None
        } else {
            Some(build_send(send, options)?)
        };

        let recv = if self.recv.as_ref().map(|d| &d.master) == Some(&recv) {
            log::debug!("same srtp recv keys applied again, keeping rollover state");
            None
        } else {
            Some(build_recv(recv, options)?)
        };

        Ok(PreparedSession { send, recv })
    }

    pub(crate) fn commit(&mut self, prepared: PreparedSession) {
        if let Some(send) = prepared.send {
            log::debug!("installed srtp send context for {:?}", send.profile());
            self.send = Some(send);
        }
        if let Some(recv) = prepared.recv {
            log::debug!("installed srtp recv context for {:?}", recv.profile());
            self.recv = Some(recv);
        }
    }

    /// Applies encrypted header extension IDs to the live context of one
    /// direction, if any.
    pub(crate) fn set_encrypted_header_extension_ids(
        &mut self,
        outgoing: bool,
        ids: &[u8],
    ) -> Result<()> {
        let direction = if outgoing {
            self.send.as_mut()
        } else {
            self.recv.as_mut()
        };

        if let Some(d) = direction {
            check_header_extension_support(d.master.profile, ids)?;
            d.context.set_encrypted_header_extension_ids(ids)?;
        }
        Ok(())
    }

    pub(crate) fn protect_rtp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        let send = self.send.as_mut().ok_or(Error::NotActive)?;
        let overhead = send.master.profile.rtp_overhead();
        protect_in_place(buf, len, overhead, |packet| {
            send.context.encrypt_rtp(packet)
        })
    }

    pub(crate) fn unprotect_rtp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        let recv = self.recv.as_mut().ok_or(Error::NotActive)?;
        unprotect_in_place(buf, len, |packet| recv.context.decrypt_rtp(packet))
    }

    pub(crate) fn protect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        let send = self.send.as_mut().ok_or(Error::NotActive)?;
        let overhead = send.master.profile.rtcp_overhead();
        protect_in_place(buf, len, overhead, |packet| {
            send.context.encrypt_rtcp(packet)
        })
    }

    pub(crate) fn unprotect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        let recv = self.recv.as_mut().ok_or(Error::NotActive)?;
        unprotect_in_place(buf, len, |packet| recv.context.decrypt_rtcp(packet))
    }
}

fn check_header_extension_support(profile: ProtectionProfile, ids: &[u8]) -> Result<()> {
    if profile.is_aead() && !ids.is_empty() {
        return Err(Error::UnsupportedWithSuite(format!("{profile:?}")));
    }
    Ok(())
}

fn build_send(master: MasterKey, options: &InstallOptions<'_>) -> Result<DirectionContext> {
    check_header_extension_support(master.profile, options.send_header_extension_ids)?;

    let mut context = Context::new(&master.key, &master.salt, master.profile, None, None)?;
    context.set_encrypted_header_extension_ids(options.send_header_extension_ids)?;
    if options.external_auth && !context.enable_external_auth() {
        log::debug!(
            "external auth requested but unavailable for {:?}",
            master.profile
        );
    }

    Ok(DirectionContext { master, context })
}

fn build_recv(master: MasterKey, options: &InstallOptions<'_>) -> Result<DirectionContext> {
    check_header_extension_support(master.profile, options.recv_header_extension_ids)?;

    let (srtp_opt, srtcp_opt) = options.config.recv_options();
    let mut context = Context::new(
        &master.key,
        &master.salt,
        master.profile,
        srtp_opt,
        srtcp_opt,
    )?;
    context.set_encrypted_header_extension_ids(options.recv_header_extension_ids)?;

    Ok(DirectionContext { master, context })
}

fn check_len(buf: &[u8], len: usize) -> Result<()> {
    if len > buf.len() {
        return Err(Error::BufferTooSmall {
            needed: len,
            capacity: buf.len(),
        });
    }
    Ok(())
}

/// Runs `protect` over `buf[..len]` and writes the result back into `buf`.
/// `buf.len()` is the capacity available for the added overhead.
fn protect_in_place<F>(buf: &mut [u8], len: usize, overhead: usize, protect: F) -> Result<usize>
where
    F: FnOnce(&[u8]) -> srtp::Result<Bytes>,
{
    check_len(buf, len)?;
    let needed = len + overhead;
    if buf.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            capacity: buf.len(),
        });
    }

    let out = protect(&buf[..len])?;
    write_back(buf, &out)
}

fn unprotect_in_place<F>(buf: &mut [u8], len: usize, unprotect: F) -> Result<usize>
where
    F: FnOnce(&[u8]) -> srtp::Result<Bytes>,
{
    check_len(buf, len)?;
    let out = unprotect(&buf[..len])?;
    write_back(buf, &out)
}

fn write_back(buf: &mut [u8], out: &[u8]) -> Result<usize> {
    let capacity = buf.len();
    let dst = buf.get_mut(..out.len()).ok_or(Error::BufferTooSmall {
        needed: out.len(),
        capacity,
    })?;
    dst.copy_from_slice(out);
    Ok(out.len())
}
