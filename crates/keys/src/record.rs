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

use crate::algorithm::HashAlgorithm;

/// The public-record constraints (RFC 6376 tags) attached to a key
/// declaration: `v`, `g`, `h`, `k`, `s`, `t`, `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub version: String,
    pub granularity: Granularity,
    pub acceptable_hashes: Vec<HashAlgorithm>,
    pub key_type: String,
    pub service_types: Vec<String>,
    pub flags: Vec<String>,
    /// Quoted-printable encoded human notes (`n`), per spec §4.1.
    pub notes: Option<String>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            version: "DKIM1".to_owned(),
            granularity: Granularity::Any,
            acceptable_hashes: Vec::new(),
            key_type: "rsa".to_owned(),
            service_types: Vec::new(),
            flags: Vec::new(),
            notes: None,
        }
    }
}

impl Record {
    /// `s` forbids subdomain identities when present.
    #[must_use]
    pub fn forbids_subdomains(&self) -> bool {
        self.flags.iter().any(|f| f == "s")
    }

    #[must_use]
    pub fn accepts_service(&self, want: &str) -> bool {
        self.service_types.is_empty()
            || self
                .service_types
                .iter()
                .any(|s| s == want || s == "*")
    }

    pub fn set_notes(&mut self, raw: &str) {
        let encoded = quoted_printable::encode(raw.as_bytes());
        self.notes = Some(String::from_utf8_lossy(&encoded).into_owned());
    }
}

/// The `g=` identity-granularity tag: `*` (or absent) matches anything, a
/// single `*` wildcard inside the value anchors a prefix/suffix match, and
/// anything else is matched exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Granularity {
    Any,
    PrefixSuffix { prefix: String, suffix: String },
    Exact(String),
}

impl Granularity {
    #[must_use]
    pub fn parse(g: &str) -> Self {
        if g.is_empty() || g == "*" {
            return Self::Any;
        }
        match g.split_once('*') {
            Some((prefix, suffix)) => Self::PrefixSuffix {
                prefix: prefix.to_owned(),
                suffix: suffix.to_owned(),
            },
            None => Self::Exact(g.to_owned()),
        }
    }

    #[must_use]
    pub fn matches(&self, local_part: &str) -> bool {
        match self {
            Self::Any => true,
            Self::PrefixSuffix { prefix, suffix } => {
                local_part.starts_with(prefix.as_str()) && local_part.ends_with(suffix.as_str())
            }
            Self::Exact(expected) => local_part == expected,
        }
    }
}
