#![warn(rust_2018_idioms)]

//! SDES-keyed SRTP for RTP and RTCP.
//!
//! [`SrtpFilter`] runs the `a=crypto` offer/answer exchange (RFC 4568),
//! installs the agreed keys into the `srtp` engine and protects or
//! unprotects packets in place.

pub use srtp;

pub mod cipher_suite;
pub mod config;
pub mod crypto_params;
pub mod error;
pub mod filter;
pub mod key_params;
pub mod negotiation;
mod session;

pub use crypto_params::{CryptoParams, NegotiationRole};
pub use error::{Error, Result};
pub use filter::{RtpAuthParams, SrtpFilter};
pub use srtp::protection_profile::ProtectionProfile;

#[macro_use]
extern crate lazy_static;
