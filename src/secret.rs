//! Symmetric (shared-secret) envelope.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cipher::{decrypt_aes_cbc_unpadded, encrypt_aes_cbc_padded, rand_bytes, AES_BLOCK_SIZE};
use crate::codec::Codec;
use crate::errors::{catch_faults, EnvelopeError};
use crate::types::{ChecksummedPayload, JunkPadded, SealedFrame};

/// AES-CBC envelope around a serde payload.
///
/// [`seal`](AesEnvelope::seal) encrypts with the first key in `keys`, using
/// the supplied IV or a random one. The AES variant (128/192/256) is chosen
/// by the first key's length, which also sizes the random junk mixed into
/// the plaintext.
///
/// [`open`](AesEnvelope::open) tries every key in order; a key is accepted
/// once decryption succeeds *and* the embedded CRC32 checksum matches.
/// [`EnvelopeError::Undecryptable`] is returned when no key fits.
///
/// If `compress` is set the serialized payload is LZ4-compressed before the
/// checksum is taken.
#[derive(Clone, Debug, Default)]
pub struct AesEnvelope {
    /// Candidate keys. The first one encrypts; all are tried on open.
    pub keys: Vec<Vec<u8>>,
    /// CBC initialization vector. Generated per seal when absent.
    pub iv: Option<Vec<u8>>,
    /// Compress the serialized payload before sealing.
    pub compress: bool,
}

impl AesEnvelope {
    /// Envelope over `keys` with a random IV and no compression.
    pub fn new(keys: Vec<Vec<u8>>) -> Self {
        Self {
            keys,
            iv: None,
            compress: false,
        }
    }

    /// Encrypts `payload` and returns the wire bytes of the sealed frame,
    /// every layer serialized through `C`.
    pub fn seal<C: Codec, T: Serialize>(&self, payload: &T) -> Result<Vec<u8>, EnvelopeError> {
        catch_faults(|| {
            if self.keys.is_empty() {
                return Err(EnvelopeError::NoKey);
            }

            let iv = match &self.iv {
                Some(iv) => iv.clone(),
                None => rand_bytes(AES_BLOCK_SIZE)?,
            };

            let inner = JunkPadded {
                payload,
                junk: rand_bytes(self.keys[0].len())?,
            };
            let raw = C::marshal(&inner).map_err(|e| EnvelopeError::Encoding {
                layer: "payload",
                detail: e.0,
            })?;

            let checksummed = ChecksummedPayload::wrap(raw, self.compress)?;
            let plain = C::marshal(&checksummed).map_err(|e| EnvelopeError::Encoding {
                layer: "payload wrapper",
                detail: e.0,
            })?;

            let ciphertext = encrypt_aes_cbc_padded(&plain, &self.keys[0], &iv)?;

            let frame = SealedFrame {
                iv,
                payload: ciphertext,
            };
            C::marshal(&frame).map_err(|e| EnvelopeError::Encoding {
                layer: "envelope",
                detail: e.0,
            })
        })
    }

    /// Decrypts wire bytes produced by [`seal`](AesEnvelope::seal) and
    /// returns the recovered payload.
    ///
    /// Per-key failures (decryption, parsing, checksum mismatch) move on to
    /// the next key. Decompression failure after a checksum match and a
    /// final payload that will not deserialize are surfaced as-is.
    pub fn open<C: Codec, T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, EnvelopeError> {
        catch_faults(|| {
            if self.keys.is_empty() {
                return Err(EnvelopeError::NoKey);
            }

            let frame: SealedFrame = C::unmarshal(data).map_err(|e| EnvelopeError::Encoding {
                layer: "envelope",
                detail: e.0,
            })?;

            for key in &self.keys {
                let Ok(plain) = decrypt_aes_cbc_unpadded(&frame.payload, key, &frame.iv) else {
                    continue;
                };
                let Ok(checksummed) = C::unmarshal::<ChecksummedPayload>(&plain) else {
                    continue;
                };
                if !checksummed.verify() {
                    continue;
                }

                let raw = checksummed.into_bytes()?;
                let inner: JunkPadded<T> =
                    C::unmarshal(&raw).map_err(|e| EnvelopeError::Encoding {
                        layer: "payload",
                        detail: e.0,
                    })?;

                return Ok(inner.payload);
            }

            Err(EnvelopeError::Undecryptable)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Json;

    #[test]
    fn no_key_fast_fail() {
        let envelope = AesEnvelope::default();
        assert_eq!(
            envelope.seal::<Json, _>(&"x").unwrap_err(),
            EnvelopeError::NoKey
        );
        assert_eq!(
            envelope.open::<Json, String>(b"{}").unwrap_err(),
            EnvelopeError::NoKey
        );
    }

    #[test]
    fn junk_makes_sealing_nondeterministic() {
        let envelope = AesEnvelope {
            keys: vec![vec![5u8; 16]],
            iv: Some(vec![1u8; AES_BLOCK_SIZE]),
            compress: false,
        };
        let a = envelope.seal::<Json, _>(&"same payload").unwrap();
        let b = envelope.seal::<Json, _>(&"same payload").unwrap();
        // Same key, same IV, same payload: the junk still varies the wire.
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_frame_is_an_encoding_error() {
        let envelope = AesEnvelope::new(vec![vec![5u8; 16]]);
        let err = envelope.open::<Json, String>(b"not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::Encoding { layer: "envelope", .. }));
    }
}
