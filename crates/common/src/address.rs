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

/// A mailbox split into local-part and domain, after RFC 5321 unquoting.
///
/// Unlike a validating address parser, this type accepts whatever the
/// client hands us: angle brackets, a source route, and a quoted local part
/// are all stripped, but the result is not re-validated as an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    local: String,
    domain: String,
}

impl Mailbox {
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `local@domain`, or `local@` / `local@domain@` when the domain is a
    /// sentinel for "missing" (see [`Mailbox::parse`]).
    #[must_use]
    pub fn to_address(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }

    /// Parse a (possibly quoted, possibly source-routed) RFC 5321 mailbox,
    /// such as `"Alice <alice@example.org>"` or `"author alice@example.org"`.
    ///
    /// The leading display name / source label is not this function's
    /// concern — pass only the address part (callers split on the first
    /// whitespace run themselves, per the `candidate` attribute format).
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let stripped = strip_angle_brackets(input.trim());
        let stripped = strip_source_route(stripped);

        match split_unquoted_at(stripped) {
            Some((local, domain)) => Self {
                local: unescape_local(local),
                domain: domain.to_lowercase(),
            },
            None => {
                // no unescaped '@' found: the whole thing is a local part.
                // `to_address` still appends the empty domain, producing the
                // `local@` trailing sentinel described by the protocol when
                // the unquoted local part itself carries a literal '@'.
                Self {
                    local: unescape_local(stripped),
                    domain: String::new(),
                }
            }
        }
    }
}

fn strip_angle_brackets(input: &str) -> &str {
    if let (Some(start), Some(end)) = (input.find('<'), input.rfind('>')) {
        if start < end {
            return &input[start + 1..end];
        }
    }
    input
}

/// Drop a `@hosta,@hostb:` source route prefix, per RFC 5321 `Path`.
fn strip_source_route(input: &str) -> &str {
    if input.starts_with('@') {
        if let Some(colon) = input.find(':') {
            return &input[colon + 1..];
        }
    }
    input
}

/// Split on the last unquoted, unescaped `@`, returning `(local, domain)`.
/// Returns `None` when no such `@` exists.
fn split_unquoted_at(input: &str) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut last_at = None;

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quotes => escaped = true,
            b'"' => in_quotes = !in_quotes,
            b'@' if !in_quotes => last_at = Some(i),
            _ => {}
        }
    }

    last_at.map(|at| (&input[..at], &input[at + 1..]))
}

/// Undo RFC 5321 quoted-pair escaping and strip a wrapping quoted-string.
fn unescape_local(local: &str) -> String {
    let inner = local
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(local);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
