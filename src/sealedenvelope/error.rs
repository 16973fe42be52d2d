//! Errors returned by envelope operations.
//!
//! The first two kinds are shape checks and are reported before any
//! cryptography runs. Everything that goes wrong inside authenticated
//! decryption collapses into `Corrupt`, whichever field was altered.

use cbor::decoder::DecodeError;
use cbor::encoder::EncodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The nonce field does not have the length the primitive requires.
    #[error("Bad nonce: envelope nonce has the wrong length")]
    BadNonce,
    /// The key field does not have the length the primitive requires.
    #[error("Bad key: envelope key has the wrong length")]
    BadKey,
    /// The envelope failed authentication.
    #[error("Corrupt envelope")]
    Corrupt,
    /// Recipient key bytes passed by the caller have the wrong length.
    #[error("Recipient key has the wrong length")]
    InvalidRecipientKey,
    /// The value could not be encoded before sealing.
    #[error("Could not encode value: {0}")]
    Encode(#[source] EncodeError),
    /// The plaintext authenticated but does not decode as the requested
    /// value.
    #[error("Could not decode value: {0}")]
    Decode(#[source] DecodeError),
    /// The secure random source could not be initialised.
    #[error("Secure random source unavailable")]
    Entropy,
}

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
