//! Unpacker for Dean Edwards' `eval(function(p,a,c,k,e,d)...)` packer

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PACKED_ARGS: Regex = Regex::new(
        r"(?s)\}\s*\(\s*'(.*)'\s*,\s*(\d+|\[\])\s*,\s*(\d+)\s*,\s*'(.*?)'\.split\('\|'\)"
    )
    .unwrap();
    static ref WORD: Regex = Regex::new(r"\b[0-9A-Za-z_]+\b").unwrap();
}

const MARKER: &str = "eval(function(p,a,c,k,e,";
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn is_packed(script: &str) -> bool {
    script.contains(MARKER)
}

/// The first packed script inside an HTML page, up to its closing tag
pub fn find_packed(html: &str) -> Option<&str> {
    let start = html.find(MARKER)?;
    let rest = &html[start..];
    let end = rest.find("</script>").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Decode a packer word in the given radix (2..=62)
pub fn decode_word(word: &str, radix: u32) -> Option<usize> {
    if !(2..=62).contains(&radix) {
        return None;
    }
    word.bytes().try_fold(0usize, |acc, b| {
        let digit = ALPHABET.iter().position(|&c| c == b)? as u32;
        if digit >= radix {
            return None;
        }
        acc.checked_mul(radix as usize)?.checked_add(digit as usize)
    })
}

/// Inverse of [`decode_word`], mirroring the packer's `e` function
pub fn encode_word(mut n: usize, radix: u32) -> Option<String> {
    if !(2..=62).contains(&radix) {
        return None;
    }
    let radix = radix as usize;
    let mut out = Vec::new();
    loop {
        out.push(ALPHABET[n % radix]);
        n /= radix;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8(out).ok()
}

/// Unpack a packed script; `None` when the arguments cannot be located
pub fn unpack(script: &str) -> Option<String> {
    let caps = PACKED_ARGS.captures(script)?;
    let payload = caps.get(1)?.as_str().replace("\\'", "'").replace("\\\\", "\\");
    let radix: u32 = match caps.get(2)?.as_str() {
        "[]" => 62,
        r => r.parse().ok()?,
    };
    let count: usize = caps.get(3)?.as_str().parse().ok()?;
    let keywords: Vec<&str> = caps.get(4)?.as_str().split('|').collect();

    if keywords.len() != count {
        return None;
    }

    let unpacked = WORD.replace_all(&payload, |c: &Captures| {
        let word = &c[0];
        match decode_word(word, radix) {
            Some(i) if i < keywords.len() && !keywords[i].is_empty() => keywords[i].to_string(),
            _ => word.to_string(),
        }
    });
    Some(unpacked.into_owned())
}
