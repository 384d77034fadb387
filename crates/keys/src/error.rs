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

/// Fatal, startup-time errors raised while declaring or indexing keys.
/// Per spec §7, these terminate the daemon; nothing here is recoverable
/// mid-request.
#[derive(Debug, thiserror::Error)]
pub enum DeclareError {
    #[error("domain must not be empty")]
    EmptyDomain,
    #[error("selector must not be empty")]
    EmptySelector,
    #[error("duplicate selector {selector:?} for domain {domain:?}")]
    DuplicateSelector { domain: String, selector: String },
    #[error("cannot read key file {path:?}: {source}")]
    ReadKeyFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("malformed PEM in {path:?}: {message}")]
    MalformedPem {
        path: std::path::PathBuf,
        message: String,
    },
    #[error("malformed domain pattern {domain:?}: {source}")]
    MalformedDomain {
        domain: String,
        source: regex::Error,
    },
}

/// Per-request signing failures, surfaced as `reason=cannot sign: <detail>`
/// rather than propagated, per spec §4.7.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("{source}")]
    Rsa {
        #[source]
        source: rsa::errors::Error,
    },
    #[error("malformed base64 digest: {source}")]
    Base64 {
        #[source]
        source: base64::DecodeError,
    },
    #[error("no signing key available for d={d:?}, s={s:?}")]
    NoKeyAvailable { d: String, s: String },
    #[error("missing required attribute {0}")]
    MissingAttribute(&'static str),
    #[error("unsupported digest algorithm {0:?}")]
    UnsupportedDigestAlgorithm(String),
}
