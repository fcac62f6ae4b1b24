//! # envseal
//!
//! A transparent encrypting envelope between application data structures and
//! a pluggable serde codec. Attach one or more keys to a payload; sealing
//! encrypts, opening verifies integrity and tries every candidate key until
//! one fits, without the caller knowing which key sealed a given message.
//!
//! ## Algorithm Suite
//!
//! - **Symmetric variant:** AES-CBC with PKCS#7 padding; the key length
//!   (16/24/32 bytes) selects AES-128/192/256
//! - **Asymmetric variant:** RSA-OAEP with a selectable digest and a label
//!   bound into the ciphertext
//! - **Integrity gate:** CRC32 (IEEE) over the wire payload; a matching
//!   checksum is what accepts a trial key
//! - **Compression:** optional LZ4 frame applied before the checksum
//! - **Wire format:** caller's choice of [`Json`], [`Cbor`], or [`Bin`],
//!   used consistently for every layer of one seal/open call
//!
//! ## Layering
//!
//! Sealing wraps the payload three times: random junk bytes are mixed in
//! (symmetric only), the serialized result is optionally compressed and
//! checksummed, and the ciphertext goes on the wire next to its IV (or
//! alone, for RSA). Opening peels the layers in reverse, trying keys in
//! order and short-circuiting on the first checksum match.
//!
//! ## Example
//!
//! ```rust
//! use envseal::{AesEnvelope, EnvelopeError, Json};
//!
//! # fn main() -> Result<(), EnvelopeError> {
//! let correct = b"0123456789ABCDEF".to_vec();
//! let wrong = b"FEDCBA9876543210".to_vec();
//!
//! let wire = AesEnvelope::new(vec![correct.clone()]).seal::<Json, _>(&"hello!")?;
//!
//! // The opener does not need to know which key sealed the message.
//! let opened: String = AesEnvelope::new(vec![wrong, correct]).open::<Json, _>(&wire)?;
//! assert_eq!(opened, "hello!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Considerations
//!
//! - The CRC32 gate distinguishes "wrong key" from "right key"; it is not an
//!   authenticated-encryption tag and does not resist adversarial tampering
//! - Keys are supplied by the caller; this crate does not generate, rotate,
//!   or store them
//! - IVs and junk bytes come from the OS CSPRNG and are safe to generate
//!   concurrently; seal and open share no mutable state
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0.

mod cipher;
mod codec;
mod errors;
mod public;
mod secret;
mod types;

pub use cipher::{
    decrypt_aes_cbc_unpadded, encrypt_aes_cbc_padded, pkcs7_pad, pkcs7_unpad, rand_bytes,
    AES_BLOCK_SIZE,
};
pub use codec::{Bin, Cbor, Codec, CodecError, Json};
pub use errors::EnvelopeError;
pub use public::{OaepHash, RsaEnvelope};
pub use secret::AesEnvelope;
pub use types::{Bare, ChecksummedPayload, JunkPadded, PkSealedFrame, SealedFrame};
