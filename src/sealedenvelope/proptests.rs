//! Property-based tests for sealing and opening.
//!
//! - Sealed bytes and marshalled values come back out unchanged
//! - A single flipped bit anywhere in a sealed envelope is `Corrupt`
//! - Shape errors win over authentication errors

use proptest::prelude::*;
use proptest::sample::Index;
use sodiumoxide::crypto::box_;

use crate::envelope::{SealedEnvelope, KEY_LEN, NONCE_LEN};
use crate::error::EnvelopeError;

fn keypair() -> (box_::PublicKey, box_::SecretKey) {
    crate::init().unwrap();
    box_::gen_keypair()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn open_returns_sealed_bytes(
        plaintext in prop::collection::vec(any::<u8>(), 0..1024)
    ) {
        let (pk, sk) = keypair();
        let envelope = SealedEnvelope::seal_new(&pk, &plaintext).unwrap();
        prop_assert_eq!(envelope.open(&sk).unwrap(), plaintext);
    }

    #[test]
    fn unmarshal_returns_marshalled_string(value in ".{0,200}") {
        let (pk, sk) = keypair();
        let envelope = SealedEnvelope::marshal_new(&pk[..], &value).unwrap();
        let mut out = String::new();
        envelope.unmarshal(&sk.0[..], &mut out).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn unmarshal_returns_marshalled_pairs(
        value in prop::collection::vec((any::<u64>(), any::<bool>()), 0..32)
    ) {
        let (pk, sk) = keypair();
        let envelope = SealedEnvelope::marshal_new(&pk[..], &value).unwrap();
        let mut out: Vec<(u64, bool)> = Vec::new();
        envelope.unmarshal(&sk.0[..], &mut out).unwrap();
        prop_assert_eq!(out, value);
    }

    #[test]
    fn any_flipped_bit_is_corrupt(
        plaintext in prop::collection::vec(any::<u8>(), 0..64),
        field in 0usize..3,
        bit in any::<Index>(),
    ) {
        let (pk, sk) = keypair();
        let mut envelope = SealedEnvelope::seal_new(&pk, &plaintext).unwrap();
        let target = match field {
            0 => &mut envelope.nonce,
            1 => &mut envelope.key,
            _ => &mut envelope.payload,
        };
        let bit = bit.index(target.len() * 8);
        target[bit / 8] ^= 1 << (bit % 8);
        prop_assert!(matches!(envelope.open(&sk), Err(EnvelopeError::Corrupt)));
    }

    #[test]
    fn shape_errors_precede_corruption(
        nonce_len in 0usize..64,
        key_len in 0usize..64,
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let (_, sk) = keypair();
        let envelope = SealedEnvelope {
            nonce: vec![0; nonce_len],
            key: vec![0; key_len],
            payload,
        };
        let result = envelope.open(&sk);
        if nonce_len != NONCE_LEN {
            prop_assert!(matches!(result, Err(EnvelopeError::BadNonce)));
        } else if key_len != KEY_LEN {
            prop_assert!(matches!(result, Err(EnvelopeError::BadKey)));
        } else {
            prop_assert!(matches!(result, Err(EnvelopeError::Corrupt)));
        }
    }
}
