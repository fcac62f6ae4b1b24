//! Wire containers and the shared integrity/compression helper.
//!
//! Three layers go on the wire, innermost first:
//!
//! 1. the application payload inside [`JunkPadded`] (symmetric) or
//!    [`Bare`] (asymmetric),
//! 2. the serialized inner envelope inside [`ChecksummedPayload`], possibly
//!    LZ4-compressed and always protected by a CRC32 checksum,
//! 3. the ciphertext inside [`SealedFrame`] (symmetric, carries the IV) or
//!    [`PkSealedFrame`] (asymmetric, ciphertext only).

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;

/// Symmetric outer container: initialization vector plus ciphertext.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SealedFrame {
    /// CBC initialization vector, one cipher block long.
    #[serde(with = "serde_bytes")]
    pub iv: Vec<u8>,
    /// AES-CBC ciphertext of the serialized [`ChecksummedPayload`].
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

/// Asymmetric outer container. OAEP needs no IV, so only ciphertext.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PkSealedFrame {
    /// RSA-OAEP ciphertext of the serialized [`ChecksummedPayload`].
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

/// Integrity container shared by both envelope variants.
///
/// The checksum is computed over `payload` exactly as stored on the wire,
/// i.e. after compression when `compressed` is set. A recomputed checksum
/// that matches is the sole signal that a trial key was the right one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecksummedPayload {
    /// Whether `payload` holds an LZ4 frame.
    pub compressed: bool,
    /// CRC32 (IEEE) of `payload`.
    pub checksum: u32,
    /// Serialized inner envelope, possibly compressed.
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl ChecksummedPayload {
    /// Wraps serialized inner-envelope bytes, compressing first if asked.
    pub fn wrap(payload: Vec<u8>, compress: bool) -> Result<Self, EnvelopeError> {
        let (payload, compressed) = if compress {
            (compress_frame(&payload)?, true)
        } else {
            (payload, false)
        };
        Ok(Self {
            compressed,
            checksum: crc32fast::hash(&payload),
            payload,
        })
    }

    /// Recomputes the checksum over the stored bytes and compares.
    ///
    /// Checked before any decompression is attempted, so a checksum computed
    /// post-compression is never conflated with one over the plain bytes.
    pub fn verify(&self) -> bool {
        crc32fast::hash(&self.payload) == self.checksum
    }

    /// Recovers the serialized inner envelope, decompressing if flagged.
    ///
    /// Callers must have verified the checksum first; a decompression
    /// failure here is surfaced as [`EnvelopeError::Compression`], not
    /// treated as a wrong key.
    pub fn into_bytes(self) -> Result<Vec<u8>, EnvelopeError> {
        if self.compressed {
            decompress_frame(&self.payload)
        } else {
            Ok(self.payload)
        }
    }
}

/// Symmetric inner envelope: the payload plus random junk bytes sized to the
/// encryption key, so identical payloads never produce identical plaintext.
#[derive(Serialize, Deserialize)]
pub struct JunkPadded<T> {
    /// The application payload.
    pub payload: T,
    /// Random filler, `keys[0].len()` bytes.
    #[serde(with = "serde_bytes")]
    pub junk: Vec<u8>,
}

/// Asymmetric inner envelope. OAEP is already randomized, so no junk.
#[derive(Serialize, Deserialize)]
pub struct Bare<T> {
    /// The application payload.
    pub payload: T,
}

fn compress_frame(data: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder
        .write_all(data)
        .map_err(|e| EnvelopeError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| EnvelopeError::Compression(e.to_string()))
}

fn decompress_frame(data: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut out = Vec::new();
    lz4_flex::frame::FrameDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| EnvelopeError::Compression(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_stores_checksum_of_stored_bytes() {
        let data = b"some payload bytes".to_vec();
        let plain = ChecksummedPayload::wrap(data.clone(), false).unwrap();
        assert!(!plain.compressed);
        assert_eq!(plain.checksum, crc32fast::hash(&data));
        assert!(plain.verify());

        let packed = ChecksummedPayload::wrap(data.clone(), true).unwrap();
        assert!(packed.compressed);
        // Checksum covers the compressed bytes, not the originals.
        assert_eq!(packed.checksum, crc32fast::hash(&packed.payload));
        assert!(packed.verify());
        assert_eq!(packed.into_bytes().unwrap(), data);
    }

    #[test]
    fn verify_catches_any_flip() {
        let mut c = ChecksummedPayload::wrap(vec![7u8; 64], false).unwrap();
        assert!(c.verify());
        c.payload[13] ^= 0x01;
        assert!(!c.verify());
    }

    #[test]
    fn corrupted_frame_fails_decompression() {
        let c = ChecksummedPayload {
            compressed: true,
            checksum: crc32fast::hash(b"not an lz4 frame"),
            payload: b"not an lz4 frame".to_vec(),
        };
        assert!(c.verify());
        assert!(matches!(
            c.into_bytes(),
            Err(EnvelopeError::Compression(_))
        ));
    }

    #[test]
    fn compression_shrinks_redundant_data() {
        let data = vec![b' '; 4096];
        let packed = ChecksummedPayload::wrap(data.clone(), true).unwrap();
        assert!(packed.payload.len() < data.len());
        assert_eq!(packed.into_bytes().unwrap(), data);
    }
}
