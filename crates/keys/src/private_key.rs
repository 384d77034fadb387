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
use crate::error::SignError;

/// A loaded PEM RSA key materialized into a usable signing object, plus the
/// identity it was loaded under (device, inode) for deduplication.
pub struct PrivateKey {
    pub(crate) rsa: rsa::RsaPrivateKey,
    pub(crate) identity: KeyIdentity,
}

/// What a private key file was deduplicated by, per spec §4.1 and the
/// design note on duplicate PEM files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyIdentity {
    DeviceInode { dev: u64, ino: u64 },
    PathAndHash { path: std::path::PathBuf, hash: [u8; 32] },
    Inline(usize),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl PrivateKey {
    #[must_use]
    pub fn from_rsa(rsa: rsa::RsaPrivateKey, identity: KeyIdentity) -> Self {
        Self { rsa, identity }
    }

    #[must_use]
    pub fn identity(&self) -> &KeyIdentity {
        &self.identity
    }

    /// PKCS#1 v1.5 sign `digest` (the raw, already-hashed bytes) under the
    /// named hash algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Rsa`] if the underlying RSA operation fails.
    pub fn sign(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<u8>, SignError> {
        let scheme = match hash {
            HashAlgorithm::Sha1 => rsa::Pkcs1v15Sign::new::<sha1::Sha1>(),
            HashAlgorithm::Sha256 => rsa::Pkcs1v15Sign::new::<sha2::Sha256>(),
        };
        self.rsa
            .sign(scheme, digest)
            .map_err(|source| SignError::Rsa { source })
    }
}

/// Compute the (device, inode) identity of a file, falling back to a
/// canonicalized path plus a content hash on platforms lacking unix
/// metadata, per the design note on duplicate PEM files.
#[must_use]
pub fn identify_file(path: &std::path::Path, contents: &[u8]) -> KeyIdentity {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            return KeyIdentity::DeviceInode {
                dev: metadata.dev(),
                ino: metadata.ino(),
            };
        }
    }
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let hash: [u8; 32] = {
        use sha2::Digest as _;
        sha2::Sha256::digest(contents).into()
    };
    KeyIdentity::PathAndHash {
        path: canonical,
        hash,
    }
}
