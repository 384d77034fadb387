/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

//! Attribute-line encoding and decoding.
//!
//! The wire transmits one value per line; an attribute that carries several
//! values (e.g. `candidate`) is simply repeated across several lines, which
//! the framing layer accumulates into an ordered list (spec §4.4).

const NAME_SAFE: &str = "._+-";

/// Errors returned while decoding a single attribute line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("line does not match `name=value` or `name: value`")]
    Malformed,
    #[error("empty attribute name")]
    EmptyName,
}

/// Encode `name=value`, percent-encoding both sides per spec §4.4. The
/// returned string does not include the trailing CR LF — the framing layer
/// owns line termination.
#[must_use]
pub fn encode_line(name: &str, value: &str) -> String {
    format!("{}={}", encode_name(name), encode_value(value))
}

fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || NAME_SAFE.as_bytes().contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02x}"));
        }
    }
    out
}

fn encode_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let code = c as u32;
        if code > 0xFF {
            tracing::warn!(codepoint = code, "non-octet value character replaced");
            out.push_str(&format!("\\x{{{code:04x}}}"));
            continue;
        }
        let byte = code as u8;
        if (0x20..=0x7E).contains(&byte) && byte != b'%' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02x}"));
        }
    }
    out
}

/// Decode a single non-empty line into `(name, value)`. Both sides are
/// percent-decoded independently.
///
/// # Errors
///
/// Returns [`DecodeError`] if the line has no `=` or `: ` separator, or if
/// the name is empty after the separator is found.
pub fn decode_line(line: &str) -> Result<(String, String), DecodeError> {
    let (name, value) = if let Some((name, rest)) = line.split_once('=') {
        (name, rest)
    } else if let Some((name, rest)) = line.split_once(':') {
        (name, rest.trim_start())
    } else {
        return Err(DecodeError::Malformed);
    };

    if name.is_empty() {
        return Err(DecodeError::EmptyName);
    }

    Ok((percent_decode(name), percent_decode(value)))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&input[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
