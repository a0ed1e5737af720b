#![warn(rust_2018_idioms)]

mod cipher;
pub mod context;
pub mod error;
mod header_extension;
mod key_derivation;
pub mod option;
pub mod protection_profile;

pub use error::{Error, Result};
