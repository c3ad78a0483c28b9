//! AES-256-CBC payload codec with the gateway's 32-byte padding.
//!
//! The gateway pads plaintexts to a multiple of 32 bytes (twice the AES
//! block size) with `p` bytes of value `p`, `p` in `1..=32`, and disables
//! the cipher's own padding. Ciphertexts travel as lowercase hex.

use std::sync::Arc;

use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use serde::Deserialize;
use tracing::debug;

use crate::{
    Credential,
    codec::EncryptedPayload,
    error::{GatewayError, Result},
};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Pad block size used by the gateway.
pub const PAD_BLOCK_SIZE: usize = 32;

/// Native AES block size.
pub const AES_BLOCK_SIZE: usize = 16;

/// How decrypted buffers are unpadded.
///
/// Both modes return a buffer ending in `}` untouched: gateway JSON replies
/// are sometimes sent without a pad block, and the final brace must survive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpadMode {
    /// Strip every trailing byte equal to the last byte.
    ///
    /// Matches the gateway's reference behaviour byte for byte, including
    /// over-stripping plaintexts whose own trailing bytes equal the pad value.
    #[default]
    GatewayCompat,
    /// Treat the last byte as the pad length and remove exactly that many
    /// bytes, rejecting malformed padding.
    Strict,
}

/// Appends `p = 32 - len % 32` bytes of value `p`.
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "pad length is at most 32")]
pub fn pad(plaintext: &[u8]) -> Vec<u8> {
    let pad_len = PAD_BLOCK_SIZE - plaintext.len() % PAD_BLOCK_SIZE;
    let mut buffer = Vec::with_capacity(plaintext.len() + pad_len);
    buffer.extend_from_slice(plaintext);
    buffer.resize(plaintext.len() + pad_len, pad_len as u8);
    buffer
}

/// Removes padding according to `mode`.
///
/// # Errors
///
/// Returns [`GatewayError::CodecError`] in [`UnpadMode::Strict`] when the pad
/// bytes are inconsistent.
pub fn unpad(mut buffer: Vec<u8>, mode: UnpadMode) -> Result<Vec<u8>> {
    let Some(&last) = buffer.last() else {
        return Ok(buffer);
    };

    if last == b'}' {
        debug!("decrypted payload ends with '}}', returning it unpadded");
        return Ok(buffer);
    }

    match mode {
        UnpadMode::GatewayCompat => {
            let keep = buffer.iter().rposition(|&b| b != last).map_or(0, |i| i + 1);
            buffer.truncate(keep);
            Ok(buffer)
        }
        UnpadMode::Strict => {
            let pad_len = usize::from(last);
            if pad_len == 0 || pad_len > PAD_BLOCK_SIZE || pad_len > buffer.len() {
                return Err(GatewayError::CodecError(format!("invalid pad length {pad_len}")));
            }
            let start = buffer.len() - pad_len;
            if buffer[start..].iter().any(|&b| b != last) {
                return Err(GatewayError::CodecError("inconsistent pad bytes".to_owned()));
            }
            buffer.truncate(start);
            Ok(buffer)
        }
    }
}

/// Encrypts and decrypts payload blobs under one merchant credential.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use spgateway::{Credential, codec::BlockCipherCodec};
///
/// let credential = Arc::new(
///     Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef").unwrap(),
/// );
/// let codec = BlockCipherCodec::new(credential);
///
/// let blob = codec.encode("MerchantID=MS12345&Amt=1000");
/// assert_eq!(blob.len(), 64);
/// assert_eq!(codec.decode_str(blob.as_str()).unwrap(), "MerchantID=MS12345&Amt=1000");
/// ```
#[derive(Debug, Clone)]
pub struct BlockCipherCodec {
    credential: Arc<Credential>,
    unpad_mode: UnpadMode,
}

impl BlockCipherCodec {
    /// Creates a codec using [`UnpadMode::GatewayCompat`].
    #[must_use]
    pub fn new(credential: Arc<Credential>) -> Self {
        Self::with_unpad_mode(credential, UnpadMode::default())
    }

    /// Creates a codec with an explicit unpadding mode.
    #[must_use]
    pub fn with_unpad_mode(credential: Arc<Credential>, unpad_mode: UnpadMode) -> Self {
        Self { credential, unpad_mode }
    }

    /// Returns the unpadding mode.
    #[must_use]
    pub fn unpad_mode(&self) -> UnpadMode {
        self.unpad_mode
    }

    /// Pads, encrypts and hex-encodes `plaintext`.
    pub fn encode(&self, plaintext: impl AsRef<[u8]>) -> EncryptedPayload {
        let padded = pad(plaintext.as_ref());
        let ciphertext =
            Aes256CbcEnc::new(self.credential.key().into(), self.credential.iv().into())
                .encrypt_padded_vec_mut::<NoPadding>(&padded);
        EncryptedPayload::from_ciphertext(&ciphertext)
    }

    /// Hex-decodes, decrypts and unpads `hex_input`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CodecError`] if the input is not hex, is empty,
    /// is not a whole number of AES blocks, or (strict mode) is badly padded.
    pub fn decode(&self, hex_input: &str) -> Result<Vec<u8>> {
        let ciphertext = hex::decode(hex_input.trim())
            .map_err(|e| GatewayError::CodecError(format!("invalid hex payload: {e}")))?;

        if ciphertext.is_empty() {
            return Err(GatewayError::CodecError("empty payload".to_owned()));
        }
        if ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return Err(GatewayError::CodecError(format!(
                "payload length {} is not a multiple of {AES_BLOCK_SIZE}",
                ciphertext.len()
            )));
        }

        let plaintext =
            Aes256CbcDec::new(self.credential.key().into(), self.credential.iv().into())
                .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
                .map_err(|_| GatewayError::CodecError("block decryption failed".to_owned()))?;

        unpad(plaintext, self.unpad_mode)
    }

    /// Like [`Self::decode`] but requires the plaintext to be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CodecError`] on any decode failure or if the
    /// plaintext is not valid UTF-8 (typically a key/IV mismatch).
    pub fn decode_str(&self, hex_input: &str) -> Result<String> {
        String::from_utf8(self.decode(hex_input)?).map_err(|_| {
            GatewayError::CodecError("decrypted payload is not valid UTF-8".to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(mode: UnpadMode) -> BlockCipherCodec {
        let credential =
            Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef")
                .unwrap();
        BlockCipherCodec::with_unpad_mode(Arc::new(credential), mode)
    }

    #[test]
    fn test_pad_lengths() {
        assert_eq!(pad(b"").len(), 32);
        assert!(pad(b"").iter().all(|&b| b == 32));
        assert_eq!(pad(&[b'a'; 31]).len(), 32);
        assert_eq!(pad(&[b'a'; 31])[31], 1);
        assert_eq!(pad(&[b'a'; 32]).len(), 64);
        assert_eq!(pad(&[b'a'; 33]).len(), 64);
        assert_eq!(pad(&[b'a'; 33])[63], 31);
    }

    #[test]
    fn test_encode_fixture() {
        let codec = codec(UnpadMode::GatewayCompat);
        assert_eq!(
            codec.encode("MerchantID=MS12345&Amt=1000").as_str(),
            "c3ee3e7ee77151ca517475567c37e33cfec0b37c8cb339d8ba835436dcde1615"
        );
        assert_eq!(
            codec.encode("").as_str(),
            "5cf69c0a924128c6194b5071903107dc387c36416753550257239067f28647da"
        );
    }

    #[test]
    fn test_full_pad_block_for_aligned_input() {
        let codec = codec(UnpadMode::GatewayCompat);
        let blob = codec.encode([b'a'; 32]);
        assert_eq!(
            blob.as_str(),
            "c7abf27eb7d7b457fc75ec1348f9135196a38e6083509bd187b779c2572d96c6\
             d55f7941e70e36ded5e1fce69fe7a924fb56144a9ccce7367a7a39662155e9d5"
        );
        assert_eq!(codec.decode(blob.as_str()).unwrap(), vec![b'a'; 32]);
    }

    #[test]
    fn test_decode_accepts_uppercase_hex() {
        let codec = codec(UnpadMode::Strict);
        let upper = "C3EE3E7EE77151CA517475567C37E33CFEC0B37C8CB339D8BA835436DCDE1615";
        assert_eq!(codec.decode_str(upper).unwrap(), "MerchantID=MS12345&Amt=1000");
    }

    #[test]
    fn test_decode_json_payload() {
        let codec = codec(UnpadMode::GatewayCompat);
        let decoded = codec
            .decode_str("a6a33edeab69cbb6cf7153eb75d3c8fca5993bcb8ef63163fcc306d723e8030d")
            .unwrap();
        assert_eq!(decoded, r#"{"Status":"SUCCESS","Amt":100}"#);
    }

    #[test]
    fn test_compat_overstrips_trailing_pad_lookalikes() {
        // 30 bytes + two 0x02 pad bytes; the plaintext's own trailing 0x02 goes too.
        let mut plaintext = vec![b'x'; 29];
        plaintext.push(2);
        let blob = codec(UnpadMode::GatewayCompat).encode(&plaintext);

        let compat = codec(UnpadMode::GatewayCompat).decode(blob.as_str()).unwrap();
        assert_eq!(compat, vec![b'x'; 29]);

        let strict = codec(UnpadMode::Strict).decode(blob.as_str()).unwrap();
        assert_eq!(strict, plaintext);
    }

    #[test]
    fn test_brace_guard_keeps_buffer() {
        assert_eq!(unpad(b"{\"a\":1}".to_vec(), UnpadMode::Strict).unwrap(), b"{\"a\":1}");
        assert_eq!(unpad(b"{\"a\":1}".to_vec(), UnpadMode::GatewayCompat).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_strict_rejects_bad_padding() {
        assert!(unpad(vec![b'a', 0], UnpadMode::Strict).is_err());
        assert!(unpad(vec![b'a', 40], UnpadMode::Strict).is_err());
        assert!(unpad(vec![b'a', 1, 3], UnpadMode::Strict).is_err());
        assert!(unpad(vec![3, 3], UnpadMode::Strict).is_err());
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        let err = codec(UnpadMode::GatewayCompat).decode("zz").unwrap_err();
        assert!(matches!(err, GatewayError::CodecError(_)));
    }

    #[test]
    fn test_decode_rejects_misaligned_length() {
        let err = codec(UnpadMode::GatewayCompat).decode("00ff").unwrap_err();
        assert!(err.to_string().contains("multiple of 16"));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(codec(UnpadMode::GatewayCompat).decode("").is_err());
    }

    #[test]
    fn test_wrong_key_does_not_roundtrip() {
        let blob = codec(UnpadMode::GatewayCompat).encode("MerchantID=MS12345&Amt=1000");
        let other = BlockCipherCodec::with_unpad_mode(
            Arc::new(
                Credential::new("MS12345", "ffffffffffffffffffffffffffffffff", "0123456789abcdef")
                    .unwrap(),
            ),
            UnpadMode::Strict,
        );
        match other.decode(blob.as_str()) {
            Ok(bytes) => assert_ne!(bytes, b"MerchantID=MS12345&Amt=1000"),
            Err(e) => assert!(matches!(e, GatewayError::CodecError(_))),
        }
    }
}
