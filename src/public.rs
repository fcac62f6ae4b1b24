//! Asymmetric (public-key) envelope.

use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Sha256, Sha384, Sha512};

use crate::codec::Codec;
use crate::errors::{catch_faults, EnvelopeError};
use crate::types::{Bare, ChecksummedPayload, PkSealedFrame};

/// Digest used for OAEP padding and mask generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OaepHash {
    /// SHA-256, the default.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl OaepHash {
    fn padding(self, label: &str) -> Oaep {
        match self {
            OaepHash::Sha256 => Oaep::new_with_label::<Sha256, _>(label),
            OaepHash::Sha384 => Oaep::new_with_label::<Sha384, _>(label),
            OaepHash::Sha512 => Oaep::new_with_label::<Sha512, _>(label),
        }
    }
}

/// RSA-OAEP envelope around a serde payload.
///
/// [`seal`](RsaEnvelope::seal) encrypts with `enc_key`;
/// [`open`](RsaEnvelope::open) tries every private key in `dec_keys` in
/// order, accepting the first whose decryption passes the CRC32 gate.
///
/// `hash` and `label` must be identical between seal and open; a mismatched
/// label behaves exactly like a wrong key. RSA bounds the plaintext by the
/// modulus size minus twice the hash length minus two, so large payloads
/// need `compress` or a larger key.
#[derive(Clone, Debug, Default)]
pub struct RsaEnvelope {
    /// Private keys tried in order on open.
    pub dec_keys: Vec<RsaPrivateKey>,
    /// Public key used by seal.
    pub enc_key: Option<RsaPublicKey>,
    /// OAEP digest. Defaults to SHA-256.
    pub hash: OaepHash,
    /// OAEP label, bound into the ciphertext. Defaults to empty.
    pub label: String,
    /// Compress the serialized payload before sealing.
    pub compress: bool,
}

impl RsaEnvelope {
    /// Sealing envelope for `enc_key` with default hash and empty label.
    pub fn to_recipient(enc_key: RsaPublicKey) -> Self {
        Self {
            enc_key: Some(enc_key),
            ..Self::default()
        }
    }

    /// Opening envelope over `dec_keys` with default hash and empty label.
    pub fn with_keys(dec_keys: Vec<RsaPrivateKey>) -> Self {
        Self {
            dec_keys,
            ..Self::default()
        }
    }

    /// Encrypts `payload` for `enc_key` and returns the wire bytes, every
    /// layer serialized through `C`.
    pub fn seal<C: Codec, T: Serialize>(&self, payload: &T) -> Result<Vec<u8>, EnvelopeError> {
        catch_faults(|| {
            let enc_key = self.enc_key.as_ref().ok_or(EnvelopeError::NoKey)?;

            let inner = Bare { payload };
            let raw = C::marshal(&inner).map_err(|e| EnvelopeError::Encoding {
                layer: "payload",
                detail: e.0,
            })?;

            let checksummed = ChecksummedPayload::wrap(raw, self.compress)?;
            let plain = C::marshal(&checksummed).map_err(|e| EnvelopeError::Encoding {
                layer: "payload wrapper",
                detail: e.0,
            })?;

            // Not retried: an oversized plaintext will not shrink.
            let ciphertext = enc_key
                .encrypt(&mut OsRng, self.hash.padding(&self.label), &plain)
                .map_err(|e| EnvelopeError::Crypto(e.to_string()))?;

            let frame = PkSealedFrame {
                payload: ciphertext,
            };
            C::marshal(&frame).map_err(|e| EnvelopeError::Encoding {
                layer: "envelope",
                detail: e.0,
            })
        })
    }

    /// Decrypts wire bytes produced by [`seal`](RsaEnvelope::seal) and
    /// returns the recovered payload, trying each private key in order.
    pub fn open<C: Codec, T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, EnvelopeError> {
        catch_faults(|| {
            if self.dec_keys.is_empty() {
                return Err(EnvelopeError::NoKey);
            }

            let frame: PkSealedFrame = C::unmarshal(data).map_err(|e| EnvelopeError::Encoding {
                layer: "envelope",
                detail: e.0,
            })?;

            for key in &self.dec_keys {
                let Ok(plain) = key.decrypt(self.hash.padding(&self.label), &frame.payload)
                else {
                    continue;
                };
                let Ok(checksummed) = C::unmarshal::<ChecksummedPayload>(&plain) else {
                    continue;
                };
                if !checksummed.verify() {
                    continue;
                }

                let raw = checksummed.into_bytes()?;
                let inner: Bare<T> = C::unmarshal(&raw).map_err(|e| EnvelopeError::Encoding {
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
        let envelope = RsaEnvelope::default();
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
    fn default_hash_is_sha256() {
        assert_eq!(OaepHash::default(), OaepHash::Sha256);
    }
}
