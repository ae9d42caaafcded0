//! Signed and obfuscated manifest requests: HMAC signatures, JWTs and
//! CryptoJS-compatible AES payloads

pub mod cryptojs;
pub mod hmac_sign;
pub mod jwt;

pub use hmac_sign::{ManifestSigner, SignatureEncoding};
pub use jwt::{find_jwt, Jwt};
