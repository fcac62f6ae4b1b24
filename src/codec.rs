//! Pluggable serialization strategy.
//!
//! The envelope never hard-wires a wire encoding. Instead every layer is
//! (de)serialized through a [`Codec`] chosen by the caller as a type
//! parameter, so the envelope's internal recursive marshals are guaranteed
//! to use the same strategy as the outermost call.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Failure reported by a [`Codec`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(pub String);

/// A serialization strategy injected into seal/open.
///
/// Implementations are zero-sized markers; the envelope calls the associated
/// functions for every layer it needs to put on or take off the wire.
pub trait Codec {
    /// Serialize a value to bytes.
    fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a value from bytes.
    fn unmarshal<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError>;
}

/// Structured-text encoding via `serde_json`.
pub struct Json;

impl Codec for Json {
    fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError(e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(data).map_err(|e| CodecError(e.to_string()))
    }
}

/// Self-describing binary encoding via `serde_cbor`.
pub struct Cbor;

impl Codec for Cbor {
    fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_cbor::to_vec(value).map_err(|e| CodecError(e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
        serde_cbor::from_slice(data).map_err(|e| CodecError(e.to_string()))
    }
}

/// Schema-driven binary encoding via `bincode`.
pub struct Bin;

impl Codec for Bin {
    fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value).map_err(|e| CodecError(e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(data).map_err(|e| CodecError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Sample {
        name: String,
        #[serde(with = "serde_bytes")]
        blob: Vec<u8>,
    }

    fn roundtrip<C: Codec>() {
        let v = Sample {
            name: "sample".to_owned(),
            blob: vec![0, 1, 2, 254, 255],
        };
        let data = C::marshal(&v).unwrap();
        let back: Sample = C::unmarshal(&data).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn json_roundtrip() {
        roundtrip::<Json>();
    }

    #[test]
    fn cbor_roundtrip() {
        roundtrip::<Cbor>();
    }

    #[test]
    fn bin_roundtrip() {
        roundtrip::<Bin>();
    }

    #[test]
    fn garbage_is_rejected() {
        let garbage = [0xDEu8, 0xAD, 0xBE, 0xEF];
        assert!(Json::unmarshal::<Sample>(&garbage).is_err());
        assert!(Cbor::unmarshal::<Sample>(&garbage).is_err());
        assert!(Bin::unmarshal::<Sample>(&garbage).is_err());
    }
}
