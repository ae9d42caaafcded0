//! AES payloads in the formats CryptoJS produces
//!
//! Passphrase mode is OpenSSL's: `"Salted__" + salt(8) + ciphertext`, key and
//! IV derived with EVP_BytesToKey (MD5, one iteration), AES-256-CBC, PKCS#7.

use crate::utils::error::SourceError;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::Deserialize;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

const SALTED: &[u8] = b"Salted__";

fn crypto_err(msg: impl std::fmt::Display) -> SourceError {
    SourceError::Crypto(msg.to_string())
}

/// OpenSSL EVP_BytesToKey with MD5 and a single round
pub fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8], key_len: usize, iv_len: usize) -> (Vec<u8>, Vec<u8>) {
    let mut derived: Vec<u8> = Vec::with_capacity(key_len + iv_len + 16);
    let mut block: Vec<u8> = Vec::new();
    while derived.len() < key_len + iv_len {
        let mut input = block.clone();
        input.extend_from_slice(passphrase);
        input.extend_from_slice(salt);
        block = md5::compute(&input).0.to_vec();
        derived.extend_from_slice(&block);
    }
    let iv = derived[key_len..key_len + iv_len].to_vec();
    derived.truncate(key_len);
    (derived, iv)
}

/// AES-CBC with an explicit key (16 or 32 bytes) and IV
pub fn decrypt_with_key(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let plain = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(crypto_err)?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(crypto_err)?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        n => return Err(crypto_err(format!("unsupported AES key length {n}")).into()),
    };
    Ok(plain.map_err(|_| crypto_err("bad padding (wrong key?)"))?)
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(bytes).map_err(crypto_err)?)
}

/// Decrypt a base64 `Salted__` blob with a passphrase
pub fn decrypt(passphrase: &str, encoded: &str) -> Result<String> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| crypto_err(format!("base64: {e}")))?;
    if raw.len() < 16 || &raw[..8] != SALTED {
        return Err(crypto_err("missing Salted__ header").into());
    }
    let (salt, body) = raw[8..].split_at(8);
    let (key, iv) = evp_bytes_to_key(passphrase.as_bytes(), salt, 32, 16);
    utf8(decrypt_with_key(&key, &iv, body)?)
}

/// CryptoJS JSON formatter output: `{"ct": base64, "iv": hex, "s": hex}`
#[derive(Debug, Deserialize)]
struct JsonPayload {
    ct: String,
    #[serde(default)]
    iv: Option<String>,
    s: String,
}

pub fn decrypt_json(passphrase: &str, json: &str) -> Result<String> {
    let payload: JsonPayload = serde_json::from_str(json).map_err(SourceError::from)?;
    let salt = hex::decode(&payload.s).map_err(|e| crypto_err(format!("salt: {e}")))?;
    let body = STANDARD
        .decode(payload.ct.trim())
        .map_err(|e| crypto_err(format!("ct: {e}")))?;
    let (key, derived_iv) = evp_bytes_to_key(passphrase.as_bytes(), &salt, 32, 16);
    let iv = match payload.iv.as_deref() {
        Some(iv) if !iv.is_empty() => hex::decode(iv).map_err(|e| crypto_err(format!("iv: {e}")))?,
        _ => derived_iv,
    };
    utf8(decrypt_with_key(&key, &iv, &body)?)
}

/// Produce the base64 `Salted__` format with a caller-chosen salt
pub fn encrypt_with_salt(passphrase: &str, plaintext: &str, salt: [u8; 8]) -> Result<String> {
    let (key, iv) = evp_bytes_to_key(passphrase.as_bytes(), &salt, 32, 16);
    let cipher = Aes256CbcEnc::new_from_slices(&key, &iv).map_err(crypto_err)?;
    let body = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut out = Vec::with_capacity(16 + body.len());
    out.extend_from_slice(SALTED);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&body);
    Ok(STANDARD.encode(out))
}
