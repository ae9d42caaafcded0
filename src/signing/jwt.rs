//! Compact JWTs embedded in player pages
//!
//! Tokens are only read, never verified: sources need the claims (expiry,
//! stream ids) and forward the raw token as a bearer.

use crate::utils::error::SourceError;
use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref JWT: Regex =
        Regex::new(r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Jwt {
    pub raw: String,
    pub header: Value,
    pub claims: Value,
}

/// First token-shaped substring of `text`
pub fn find_jwt(text: &str) -> Option<&str> {
    JWT.find(text).map(|m| m.as_str())
}

fn decode_segment(segment: &str) -> Result<Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| SourceError::Crypto(format!("jwt segment: {e}")))?;
    Ok(serde_json::from_slice(&bytes).map_err(SourceError::from)?)
}

impl Jwt {
    pub fn decode(token: &str) -> Result<Self> {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(claims), Some(_sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SourceError::Crypto("jwt must have three segments".into()).into());
        };
        Ok(Self {
            raw: token.trim().to_string(),
            header: decode_segment(header)?,
            claims: decode_segment(claims)?,
        })
    }

    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// `exp` claim in epoch seconds
    pub fn expires_at(&self) -> Option<i64> {
        let exp = self.claims.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    /// Tokens without `exp` never expire
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}
