use cbor::decoder::{DecodeError, DecodeResult, Decoder};
use cbor::encoder::{EncodeError, EncodeResult, Encoder};
use cbor::Config;
use std::error::Error;
use std::fmt;
use std::io::Cursor;

pub type EncoderVec = Encoder<Cursor<Vec<u8>>>;
pub type DecoderVec = Decoder<Cursor<Vec<u8>>>;

/// Run a CBOR encoder and get a bytestring.
///
/// `run_encoder` creates a new encoder, passes it to `enc` and then
/// converts the result to a `Vec<u8>`.
pub fn run_encoder(
    enc: &dyn Fn(&mut EncoderVec) -> EncodeResult,
) -> Result<Vec<u8>, EncodeError> {
    let mut e = Encoder::new(Cursor::new(Vec::new()));
    enc(&mut e).and(Ok(e.into_writer().into_inner()))
}

/// Decoder limits for an input of `len` bytes.
///
/// No single item can be longer, hold more elements or nest deeper than
/// the input it was read from, so bounding by `len` rejects nothing that
/// `run_encoder` can produce.
pub fn config_for_len(len: usize) -> Config {
    Config {
        max_len_array: len,
        max_len_bytes: len,
        max_len_text: len,
        max_size_map: len,
        max_nesting: len + 1,
        ..Config::default()
    }
}

/// Run a CBOR decoder on a bytestring and fail if `dec` leaves any input
/// unread.
pub fn run_decoder_full<T>(
    bytes: Vec<u8>,
    dec: &dyn Fn(&mut DecoderVec) -> DecodeResult<T>,
) -> DecodeResult<T> {
    let len = bytes.len();
    let mut d = Decoder::new(config_for_len(len), Cursor::new(bytes));
    let value = dec(&mut d)?;
    let consumed = d.into_reader().position() as usize;
    if consumed != len {
        return Err(CborDecodeError::TrailingBytes(len - consumed).into());
    }
    Ok(value)
}

/// Read an array header and check that it has exactly `expected` elements.
pub fn ensure_array_length(
    d: &mut DecoderVec,
    name: &'static str,
    expected: usize,
) -> DecodeResult<()> {
    let n = d.array()?;
    if n != expected {
        return Err(CborDecodeError::InvalidArrayLen(name, expected, n).into());
    }
    Ok(())
}

// Decoding errors /////////////////////////////////////////////////////////

#[derive(Debug)]
pub enum CborDecodeError {
    /// A value (represented as an array) had wrong number of elements. The
    /// error provides: value's type, expected array size, actual array
    /// size.
    InvalidArrayLen(&'static str, usize, usize),
    /// A field was expected in a map, but was not found. The error
    /// provides: field's descriptive name (even if the key for the field is
    /// not a string but e.g. an integer).
    MissingField(&'static str),
    /// A field was encountered twice in a map. The error provides: field's
    /// descriptive name.
    DuplicateField(&'static str),
    /// The value was decoded but this many bytes were left over.
    TrailingBytes(usize),
}

impl From<CborDecodeError> for DecodeError {
    fn from(error: CborDecodeError) -> Self {
        DecodeError::Other(Box::new(error))
    }
}

impl fmt::Display for CborDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            CborDecodeError::InvalidArrayLen(t, e, a) => write!(
                f,
                "Wrong length ({}): expected array of length {}, got {}",
                t, e, a
            ),
            CborDecodeError::MissingField(s) => {
                write!(f, "Missing field: {}", s)
            }
            CborDecodeError::DuplicateField(s) => {
                write!(f, "Duplicate field: {}", s)
            }
            CborDecodeError::TrailingBytes(n) => {
                write!(f, "{} trailing bytes after value", n)
            }
        }
    }
}

impl Error for CborDecodeError {}

// Values that can be marshalled into an envelope //////////////////////////

/// A value with a canonical CBOR representation.
///
/// `decode` must accept exactly what `encode` produces, so that a value
/// marshalled into an envelope comes back out unchanged.
pub trait CborValue: Sized {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult;
    fn decode(d: &mut DecoderVec) -> DecodeResult<Self>;

    fn to_cbor(&self) -> Result<Vec<u8>, EncodeError> {
        run_encoder(&|e| self.encode(e))
    }

    fn from_cbor(bytes: Vec<u8>) -> DecodeResult<Self> {
        run_decoder_full(bytes, &|d| Self::decode(d))
    }
}

/// A CBOR byte string. `Vec<u8>` encodes as an array of integers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Bytes {
        Bytes(v)
    }
}

impl CborValue for Bytes {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.bytes(&self.0)
    }
    fn decode(d: &mut DecoderVec) -> DecodeResult<Bytes> {
        d.bytes().map(Bytes)
    }
}

impl CborValue for String {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.text(self)
    }
    fn decode(d: &mut DecoderVec) -> DecodeResult<String> {
        d.text()
    }
}

impl CborValue for bool {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.bool(*self)
    }
    fn decode(d: &mut DecoderVec) -> DecodeResult<bool> {
        d.bool()
    }
}

macro_rules! cbor_int {
    ($($t:ident),*) => {
        $(
            impl CborValue for $t {
                fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
                    e.$t(*self)
                }
                fn decode(d: &mut DecoderVec) -> DecodeResult<$t> {
                    d.$t()
                }
            }
        )*
    }
}

cbor_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl<T: CborValue> CborValue for Vec<T> {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.array(self.len())?;
        for x in self {
            x.encode(e)?;
        }
        Ok(())
    }
    fn decode(d: &mut DecoderVec) -> DecodeResult<Vec<T>> {
        let n = d.array()?;
        let mut v = Vec::new();
        for _ in 0..n {
            v.push(T::decode(d)?);
        }
        Ok(v)
    }
}

impl<A: CborValue, B: CborValue> CborValue for (A, B) {
    fn encode(&self, e: &mut EncoderVec) -> EncodeResult {
        e.array(2)?;
        self.0.encode(e)?;
        self.1.encode(e)
    }
    fn decode(d: &mut DecoderVec) -> DecodeResult<(A, B)> {
        ensure_array_length(d, "pair", 2)?;
        let a = A::decode(d)?;
        let b = B::decode(d)?;
        Ok((a, b))
    }
}

// Helper macros for decoding maps /////////////////////////////////////////

#[macro_export]
macro_rules! to_field {
    ($test: expr, $msg: expr) => {
        match $test {
            Some(val) => val,
            None => {
                return Err(
                    $crate::cbor_utils::CborDecodeError::MissingField($msg).into()
                )
            }
        }
    };
}

#[macro_export]
macro_rules! uniq {
    ($msg: expr, $name: ident, $action: expr) => {
        if $name.is_some() {
            return Err(
                $crate::cbor_utils::CborDecodeError::DuplicateField($msg).into()
            );
        } else {
            $name = Some($action)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = String::from("abc").to_cbor().unwrap();
        bytes.push(0);
        match String::from_cbor(bytes) {
            Err(DecodeError::Other(e)) => {
                assert_eq!(e.to_string(), "1 trailing bytes after value")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn pair_length_checked() {
        let bytes = vec![1u32, 2, 3].to_cbor().unwrap();
        match <(u32, u32)>::from_cbor(bytes) {
            Err(DecodeError::Other(e)) => assert_eq!(
                e.to_string(),
                "Wrong length (pair): expected array of length 2, got 3"
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn byte_string_differs_from_array() {
        let raw = vec![1u8, 2, 3];
        let as_array = raw.to_cbor().unwrap();
        let as_bytes = Bytes(raw.clone()).to_cbor().unwrap();
        assert_ne!(as_array, as_bytes);
        assert_eq!(Bytes::from_cbor(as_bytes).unwrap(), Bytes(raw));
        assert!(Bytes::from_cbor(as_array).is_err());
    }

    #[test]
    fn nested_values() {
        let value = vec![
            (String::from("alpha"), -7i64),
            (String::from(""), i64::max_value()),
        ];
        let bytes = value.to_cbor().unwrap();
        assert_eq!(Vec::<(String, i64)>::from_cbor(bytes).unwrap(), value);
    }

    #[test]
    fn limits_follow_input_length() {
        let config = config_for_len(0x600000);
        assert_eq!(config.max_len_array, 0x600000);
        assert_eq!(config.max_len_bytes, 0x600000);
        assert_eq!(config.max_nesting, 0x600001);
        assert_eq!(config_for_len(0).max_nesting, 1);

        let many: Vec<u32> = (0..1001).collect();
        assert_eq!(Vec::<u32>::from_cbor(many.to_cbor().unwrap()).unwrap(), many);
    }

    #[test]
    fn empty_input_is_eof() {
        match String::from_cbor(Vec::new()) {
            Err(DecodeError::IoError(_)) | Err(DecodeError::UnexpectedEOF) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let value = (true, String::from("Hello, World"));
        assert_eq!(value.to_cbor().unwrap(), value.to_cbor().unwrap());
    }
}
