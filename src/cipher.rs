//! AES-CBC shim, PKCS#7 padding, and the random-byte helper.
//!
//! Key length selects the cipher variant: 16, 24, or 32 bytes for
//! AES-128/192/256. Plaintext is always padded to the 16-byte AES block.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::EnvelopeError;

/// AES block size in bytes, for every key length.
pub const AES_BLOCK_SIZE: usize = 16;

/// Fills a buffer from the OS CSPRNG. Safe for concurrent use.
pub fn rand_bytes(len: usize) -> Result<Vec<u8>, EnvelopeError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| EnvelopeError::Crypto(format!("random source: {e}")))?;
    Ok(buf)
}

/// Pads `data` to a multiple of `block_len`, PKCS#7 style.
///
/// Always adds between 1 and `block_len` bytes, never zero.
pub fn pkcs7_pad(data: &[u8], block_len: usize) -> Result<Vec<u8>, EnvelopeError> {
    if block_len == 0 || block_len > 255 {
        return Err(EnvelopeError::InvalidInput(format!(
            "invalid block length {block_len}"
        )));
    }

    let pad_len = block_len - data.len() % block_len;
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.extend(std::iter::repeat(pad_len as u8).take(pad_len));

    Ok(out)
}

/// Validates and strips PKCS#7 padding.
pub fn pkcs7_unpad(data: &[u8], block_len: usize) -> Result<Vec<u8>, EnvelopeError> {
    if block_len == 0 || block_len > 255 {
        return Err(EnvelopeError::InvalidInput(format!(
            "invalid block length {block_len}"
        )));
    }
    if data.is_empty() || data.len() % block_len != 0 {
        return Err(EnvelopeError::InvalidInput(format!(
            "invalid data length {}",
            data.len()
        )));
    }

    let pad_len = data[data.len() - 1] as usize;
    if pad_len == 0 || pad_len > block_len {
        return Err(EnvelopeError::InvalidInput(format!(
            "invalid padding length {pad_len}"
        )));
    }
    if data[data.len() - pad_len..]
        .iter()
        .any(|&b| b as usize != pad_len)
    {
        return Err(EnvelopeError::InvalidInput("invalid padding".to_owned()));
    }

    Ok(data[..data.len() - pad_len].to_vec())
}

/// Pads the plaintext to the AES block and encrypts it in CBC mode.
pub fn encrypt_aes_cbc_padded(
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let padded = pkcs7_pad(plaintext, AES_BLOCK_SIZE)?;
    if iv.len() != AES_BLOCK_SIZE {
        return Err(EnvelopeError::Crypto(format!(
            "invalid IV length {}",
            iv.len()
        )));
    }

    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(init_err)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(init_err)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(init_err)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        n => {
            return Err(EnvelopeError::Crypto(format!("invalid AES key size {n}")));
        }
    };

    Ok(ciphertext)
}

/// Decrypts CBC ciphertext and strips the PKCS#7 padding.
pub fn decrypt_aes_cbc_unpadded(
    ciphertext: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(EnvelopeError::InvalidInput(format!(
            "invalid ciphertext length {}",
            ciphertext.len()
        )));
    }
    if iv.len() != AES_BLOCK_SIZE {
        return Err(EnvelopeError::Crypto(format!(
            "invalid IV length {}",
            iv.len()
        )));
    }

    let plain = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(init_err)?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(unpad_err)?,
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(init_err)?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(unpad_err)?,
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(init_err)?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(unpad_err)?,
        n => {
            return Err(EnvelopeError::Crypto(format!("invalid AES key size {n}")));
        }
    };

    pkcs7_unpad(&plain, AES_BLOCK_SIZE)
}

fn init_err(e: aes::cipher::InvalidLength) -> EnvelopeError {
    EnvelopeError::Crypto(format!("cipher init: {e}"))
}

fn unpad_err(e: aes::cipher::block_padding::UnpadError) -> EnvelopeError {
    EnvelopeError::InvalidInput(format!("cbc decrypt: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_always_adds_and_aligns() {
        for len in 0..64 {
            let data = vec![0xA5u8; len];
            let padded = pkcs7_pad(&data, AES_BLOCK_SIZE).unwrap();
            assert_eq!(padded.len() % AES_BLOCK_SIZE, 0);
            let added = padded.len() - data.len();
            assert!((1..=AES_BLOCK_SIZE).contains(&added));
            assert_eq!(pkcs7_unpad(&padded, AES_BLOCK_SIZE).unwrap(), data);
        }
    }

    #[test]
    fn unpad_rejects_malformed_input() {
        assert!(pkcs7_unpad(&[], 16).is_err());
        assert!(pkcs7_unpad(&[1u8; 15], 16).is_err());
        // pad length zero
        assert!(pkcs7_unpad(&[0u8; 16], 16).is_err());
        // pad length larger than block
        let mut block = [0u8; 16];
        block[15] = 17;
        assert!(pkcs7_unpad(&block, 16).is_err());
        // inconsistent pad bytes
        let mut block = [2u8; 16];
        block[14] = 3;
        assert!(pkcs7_unpad(&block, 16).is_err());
        // zero block length
        assert!(pkcs7_pad(b"x", 0).is_err());
        assert!(pkcs7_unpad(&[1u8; 16], 0).is_err());
    }

    #[test]
    fn cbc_roundtrip_all_key_sizes() {
        let iv = [7u8; AES_BLOCK_SIZE];
        let plaintext = b"attack at dawn, bring snacks";
        for key_len in [16usize, 24, 32] {
            let key = vec![9u8; key_len];
            let ct = encrypt_aes_cbc_padded(plaintext, &key, &iv).unwrap();
            assert_eq!(ct.len() % AES_BLOCK_SIZE, 0);
            assert_ne!(&ct[..], &plaintext[..]);
            let pt = decrypt_aes_cbc_unpadded(&ct, &key, &iv).unwrap();
            assert_eq!(pt, plaintext);
        }
    }

    #[test]
    fn bad_key_size_is_rejected() {
        let iv = [0u8; AES_BLOCK_SIZE];
        let err = encrypt_aes_cbc_padded(b"data", &[1u8; 15], &iv).unwrap_err();
        assert!(matches!(err, EnvelopeError::Crypto(_)));
        let err = decrypt_aes_cbc_unpadded(&[0u8; 16], &[1u8; 15], &iv).unwrap_err();
        assert!(matches!(err, EnvelopeError::Crypto(_)));
    }

    #[test]
    fn wrong_key_garbles_plaintext() {
        let iv = [3u8; AES_BLOCK_SIZE];
        let ct = encrypt_aes_cbc_padded(b"hello cbc", &[1u8; 16], &iv).unwrap();
        // Wrong key either fails padding validation or yields different bytes.
        match decrypt_aes_cbc_unpadded(&ct, &[2u8; 16], &iv) {
            Err(_) => {}
            Ok(pt) => assert_ne!(pt, b"hello cbc"),
        }
    }

    #[test]
    fn rand_bytes_len_and_variability() {
        let a = rand_bytes(32).unwrap();
        let b = rand_bytes(32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(rand_bytes(0).unwrap().is_empty());
    }
}
