//! Error types for envseal operations.

use thiserror::Error;

/// Errors that can occur while sealing or opening an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No key (or key list) was supplied where one is required.
    #[error("key has to be provided")]
    NoKey,

    /// No candidate key produced a checksum-verified plaintext.
    ///
    /// Deliberately carries no detail about which key failed or why.
    #[error("data could not be decrypted")]
    Undecryptable,

    /// Malformed padding, invalid block length, or otherwise unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failed, with the layer that failed.
    #[error("encoding {layer}: {detail}")]
    Encoding {
        /// Which envelope layer was being (de)serialized.
        layer: &'static str,
        /// Codec error message.
        detail: String,
    },

    /// A cipher or public-key primitive rejected its input
    /// (bad key size, plaintext too long for the modulus, failed RNG).
    #[error("crypto primitive: {0}")]
    Crypto(String),

    /// Compression or decompression failed after integrity was already
    /// verified. Distinct from [`EnvelopeError::Undecryptable`] since the
    /// checksum attested the bytes; this indicates codec-path corruption.
    #[error("compression: {0}")]
    Compression(String),

    /// An unexpected runtime fault was caught at the call boundary.
    #[error("recovered from internal fault: {0}")]
    Recovered(String),
}

/// Runs `f`, converting any panic into [`EnvelopeError::Recovered`] so that
/// seal/open keep their always-returning contract.
pub(crate) fn catch_faults<T>(
    f: impl FnOnce() -> Result<T, EnvelopeError>,
) -> Result<T, EnvelopeError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).unwrap_or_else(|panic| {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Err(EnvelopeError::Recovered(msg))
    })
}
