//! Sealed envelopes: payloads encrypted and authenticated for a single
//! recipient's public key.
//!
//! ```
//! use sealedenvelope::SealedEnvelope;
//! use sodiumoxide::crypto::box_;
//!
//! sealedenvelope::init().unwrap();
//! let (pk, sk) = box_::gen_keypair();
//!
//! let envelope = SealedEnvelope::seal_new(&pk, b"Hello, World").unwrap();
//! assert_eq!(envelope.open(&sk).unwrap(), b"Hello, World".to_vec());
//!
//! let mut envelope = SealedEnvelope::new();
//! envelope.marshal(&pk[..], &String::from("Hello, World")).unwrap();
//! let mut out = String::new();
//! envelope.unmarshal(&sk.0[..], &mut out).unwrap();
//! assert_eq!(out, "Hello, World");
//! ```

#[macro_use]
pub mod cbor_utils;
pub mod envelope;
pub mod error;
pub mod rand_utils;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use crate::cbor_utils::{Bytes, CborValue};
pub use crate::envelope::SealedEnvelope;
pub use crate::error::{EnvelopeError, EnvelopeResult};

/// Initialise libsodium. Safe to call more than once and from several
/// threads; `seal` calls it too.
pub fn init() -> EnvelopeResult<()> {
    sodiumoxide::init().map_err(|()| EnvelopeError::Entropy)
}
