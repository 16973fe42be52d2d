//! The sealed envelope.
//!
//! An envelope carries a payload encrypted and authenticated for a single
//! recipient with the NaCl `box` construction (X25519, XSalsa20,
//! Poly1305). Every seal generates a fresh ephemeral key pair; the
//! ephemeral public key travels in the `key` field and the ephemeral
//! secret key is dropped as soon as the payload is sealed. The recipient
//! therefore needs nothing but their own secret key to open it, and the
//! envelope says nothing about who sealed it.

use cbor::{DecodeResult, EncodeResult};
use sodiumoxide::crypto::box_;
use std::fmt;
use tracing::{debug, trace};

use crate::cbor_utils::{CborValue, DecoderVec, EncoderVec};
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::utils::fmt_hex;

/// Length of the `nonce` field.
pub const NONCE_LEN: usize = box_::NONCEBYTES;
/// Length of the `key` field, and of recipient public keys.
pub const KEY_LEN: usize = box_::PUBLICKEYBYTES;
/// Length of recipient secret keys.
pub const SECRET_KEY_LEN: usize = box_::SECRETKEYBYTES;
/// Length of the authentication tag; the shortest possible payload.
pub const TAG_LEN: usize = box_::MACBYTES;

/// A payload sealed for one recipient.
///
/// The fields are public so that an envelope can be framed however the
/// caller likes. Modifying a sealed envelope makes it fail to open.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SealedEnvelope {
    pub nonce: Vec<u8>,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

impl SealedEnvelope {
    pub fn new() -> SealedEnvelope {
        SealedEnvelope::default()
    }

    /// Create an envelope holding `plaintext` sealed for `recipient`.
    pub fn seal_new(
        recipient: &box_::PublicKey,
        plaintext: &[u8],
    ) -> EnvelopeResult<SealedEnvelope> {
        let mut envelope = SealedEnvelope::new();
        envelope.seal(recipient, plaintext)?;
        Ok(envelope)
    }

    /// Create an envelope holding `value` marshalled for the recipient
    /// public key `recipient`.
    pub fn marshal_new<T: CborValue>(
        recipient: &[u8],
        value: &T,
    ) -> EnvelopeResult<SealedEnvelope> {
        let mut envelope = SealedEnvelope::new();
        envelope.marshal(recipient, value)?;
        Ok(envelope)
    }

    /// Encrypt and authenticate `plaintext` for `recipient`, replacing
    /// whatever the envelope held before.
    pub fn seal(
        &mut self,
        recipient: &box_::PublicKey,
        plaintext: &[u8],
    ) -> EnvelopeResult<()> {
        crate::init()?;
        let (ephemeral_pk, ephemeral_sk) = box_::gen_keypair();
        let nonce = box_::gen_nonce();
        let payload = box_::seal(plaintext, &nonce, recipient, &ephemeral_sk);
        self.nonce = nonce.0.to_vec();
        self.key = ephemeral_pk.0.to_vec();
        self.payload = payload;
        debug!(payload_len = self.payload.len(), "sealed envelope");
        Ok(())
    }

    /// Check and decrypt the envelope with the recipient's secret key.
    ///
    /// Shape problems are reported as `BadNonce` or `BadKey`, in that
    /// order. Any envelope that has the right shape but does not
    /// authenticate is `Corrupt`.
    pub fn open(&self, recipient: &box_::SecretKey) -> EnvelopeResult<Vec<u8>> {
        let (nonce, key) = self.check_shape()?;
        // X25519 ignores the top bit of a public key, so flipping it
        // would go unnoticed. Ephemeral keys never have it set.
        if self.payload.len() < TAG_LEN || key.0[KEY_LEN - 1] & 0x80 != 0 {
            return Err(corrupt());
        }
        let plaintext = box_::open(&self.payload, &nonce, &key, recipient)
            .map_err(|()| corrupt())?;
        debug!(plaintext_len = plaintext.len(), "opened envelope");
        Ok(plaintext)
    }

    /// Encode `value` and seal it for the recipient public key given as
    /// raw bytes.
    pub fn marshal<T: CborValue>(
        &mut self,
        recipient: &[u8],
        value: &T,
    ) -> EnvelopeResult<()> {
        let recipient = box_::PublicKey::from_slice(recipient)
            .ok_or(EnvelopeError::InvalidRecipientKey)?;
        let encoded = value.to_cbor().map_err(EnvelopeError::Encode)?;
        self.seal(&recipient, &encoded)
    }

    /// Open the envelope with the recipient secret key given as raw bytes
    /// and decode the plaintext into `out`.
    ///
    /// `out` is only written when both opening and decoding succeed.
    pub fn unmarshal<T: CborValue>(
        &self,
        recipient: &[u8],
        out: &mut T,
    ) -> EnvelopeResult<()> {
        let recipient = box_::SecretKey::from_slice(recipient)
            .ok_or(EnvelopeError::InvalidRecipientKey)?;
        let plaintext = self.open(&recipient)?;
        *out = T::from_cbor(plaintext).map_err(EnvelopeError::Decode)?;
        Ok(())
    }

    /// Whether every field has a shape that could have come out of `seal`.
    /// Says nothing about whether the envelope authenticates.
    pub fn is_sealed(&self) -> bool {
        self.nonce.len() == NONCE_LEN
            && self.key.len() == KEY_LEN
            && self.payload.len() >= TAG_LEN
    }

    /// Serialize the envelope as a CBOR map.
    pub fn as_bytes(&self) -> EnvelopeResult<Vec<u8>> {
        self.to_cbor().map_err(EnvelopeError::Encode)
    }

    /// Parse an envelope produced by `as_bytes`. Field lengths are not
    /// checked here; `open` does that.
    pub fn from_bytes(bs: Vec<u8>) -> EnvelopeResult<SealedEnvelope> {
        SealedEnvelope::from_cbor(bs).map_err(EnvelopeError::Decode)
    }

    fn check_shape(&self) -> EnvelopeResult<(box_::Nonce, box_::PublicKey)> {
        let nonce = box_::Nonce::from_slice(&self.nonce).ok_or_else(|| {
            trace!(len = self.nonce.len(), "rejected envelope: bad nonce");
            EnvelopeError::BadNonce
        })?;
        let key = box_::PublicKey::from_slice(&self.key).ok_or_else(|| {
            trace!(len = self.key.len(), "rejected envelope: bad key");
            EnvelopeError::BadKey
        })?;
        Ok((nonce, key))
    }
}

fn corrupt() -> EnvelopeError {
    debug!("envelope failed authentication");
    EnvelopeError::Corrupt
}

impl fmt::Debug for SealedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SealedEnvelope")
            .field("nonce", &fmt_hex(&self.nonce))
            .field("key", &fmt_hex(&self.key))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl CborValue for SealedEnvelope {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.object(3)?;
        e.u8(0)?; e.bytes(&self.nonce)?;
        e.u8(1)?; e.bytes(&self.key)?;
        e.u8(2)?; e.bytes(&self.payload)?;
        Ok(())
    }

    fn decode(d: &mut DecoderVec) -> DecodeResult<SealedEnvelope> {
        let n = d.object()?;
        let mut nonce   = None;
        let mut key     = None;
        let mut payload = None;
        for _ in 0..n {
            match d.u8()? {
                0 => uniq!("SealedEnvelope::nonce", nonce, d.bytes()?),
                1 => uniq!("SealedEnvelope::key", key, d.bytes()?),
                2 => uniq!("SealedEnvelope::payload", payload, d.bytes()?),
                _ => d.skip()?,
            }
        }
        Ok(SealedEnvelope {
            nonce:   to_field!(nonce, "SealedEnvelope::nonce"),
            key:     to_field!(key, "SealedEnvelope::key"),
            payload: to_field!(payload, "SealedEnvelope::payload"),
        })
    }
}
