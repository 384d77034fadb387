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

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Once};

use crate::declaration::{DomainMatcher, KeyDeclaration};
use crate::error::DeclareError;
use crate::private_key::{identify_file, KeyIdentity, PrivateKey};
use crate::record::Record;

/// Above this many declarations the linear duplicate-selector check is
/// skipped, per spec §4.1 ("Duplicate check is skipped once more than 100
/// declarations exist").
const DUPLICATE_CHECK_LIMIT: usize = 100;

static WILDCARD_WARNING: Once = Once::new();

/// Where a key came from, for deduplication: a PEM file on disk (dedup by
/// (device, inode), or a path+hash fallback), or inline PEM text supplied
/// directly (e.g. in tests).
pub enum KeySource<'a> {
    File(&'a Path),
    Inline(&'a str),
}

/// The Key Store (C1): an ordered, append-only list of declarations,
/// indexed by literal domain after [`KeyStore::postprocess`] runs.
#[derive(Debug, Default)]
pub struct KeyStore {
    declarations: Vec<KeyDeclaration>,
    keys_by_identity: HashMap<KeyIdentityKey, Arc<PrivateKey>>,
    by_domain: HashMap<String, Vec<usize>>,
    had_wildcard: bool,
}

/// [`KeyIdentity`] is not `Eq`/`Hash` over floating content (hash is a
/// fixed array so it is), used purely as a map key for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyIdentityKey {
    DeviceInode(u64, u64),
    PathAndHash(std::path::PathBuf, [u8; 32]),
    Inline(usize),
}

impl From<&KeyIdentity> for KeyIdentityKey {
    fn from(identity: &KeyIdentity) -> Self {
        match identity {
            KeyIdentity::DeviceInode { dev, ino } => Self::DeviceInode(*dev, *ino),
            KeyIdentity::PathAndHash { path, hash } => {
                Self::PathAndHash(path.clone(), *hash)
            }
            KeyIdentity::Inline(n) => Self::Inline(*n),
        }
    }
}

impl KeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one key under `domain`/`selector`. Validates non-empty
    /// domain/selector, loads (or reuses, by file identity) the underlying
    /// private key, and appends an entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DeclareError`] for empty domain/selector, a duplicate
    /// selector on a literal domain, an unreadable file, or malformed PEM.
    pub fn declare_key(
        &mut self,
        domain: &str,
        selector: &str,
        source: KeySource<'_>,
        mut record: Record,
    ) -> Result<(), DeclareError> {
        if domain.is_empty() {
            return Err(DeclareError::EmptyDomain);
        }
        if selector.is_empty() {
            return Err(DeclareError::EmptySelector);
        }
        let domain_lower = domain.to_lowercase();
        let selector_lower = selector.to_lowercase();

        if self.declarations.len() <= DUPLICATE_CHECK_LIMIT {
            if let Some(existing) = self.declarations.iter().find(|d| {
                d.literal_domain == domain_lower && d.selector == selector_lower
            }) {
                return Err(DeclareError::DuplicateSelector {
                    domain: existing.literal_domain.clone(),
                    selector: existing.selector.clone(),
                });
            }
        }

        let key = self.load_key(source, &mut record)?;
        let matcher = DomainMatcher::parse(&domain_lower).map_err(|source| {
            DeclareError::MalformedDomain {
                domain: domain_lower.clone(),
                source,
            }
        })?;

        self.declarations.push(KeyDeclaration {
            domain: matcher,
            literal_domain: domain_lower,
            selector: selector_lower,
            key,
            record,
        });
        Ok(())
    }

    fn load_key(
        &mut self,
        source: KeySource<'_>,
        record: &mut Record,
    ) -> Result<Arc<PrivateKey>, DeclareError> {
        record.key_type = "rsa".to_owned();

        let (pem, identity) = match source {
            KeySource::File(path) => {
                let contents = std::fs::read(path).map_err(|source| DeclareError::ReadKeyFile {
                    path: path.to_path_buf(),
                    source,
                })?;
                let identity = identify_file(path, &contents);
                if let Some(existing) = self.keys_by_identity.get(&KeyIdentityKey::from(&identity)) {
                    return Ok(Arc::clone(existing));
                }
                (
                    String::from_utf8_lossy(&contents).into_owned(),
                    identity,
                )
            }
            KeySource::Inline(text) => {
                (text.to_owned(), KeyIdentity::Inline(self.declarations.len()))
            }
        };

        let path_for_errors = match &identity {
            KeyIdentity::DeviceInode { .. } | KeyIdentity::Inline(_) => {
                std::path::PathBuf::from("<inline>")
            }
            KeyIdentity::PathAndHash { path, .. } => path.clone(),
        };

        let rsa = parse_rsa_pem(&pem).map_err(|message| DeclareError::MalformedPem {
            path: path_for_errors,
            message,
        })?;

        let key = Arc::new(PrivateKey::from_rsa(rsa, identity.clone()));
        self.keys_by_identity
            .insert(KeyIdentityKey::from(&identity), Arc::clone(&key));
        Ok(key)
    }

    /// Build the domain index, compile wildcard patterns into the synthetic
    /// `*` bucket, and fill record defaults. Idempotent: running it twice
    /// over an unchanged declaration list yields equal indexes (spec
    /// invariant 6).
    pub fn postprocess(&mut self) {
        self.by_domain.clear();
        self.had_wildcard = false;

        for (index, declaration) in self.declarations.iter().enumerate() {
            if declaration.domain.is_wildcard() {
                self.had_wildcard = true;
                self.by_domain.entry("*".to_owned()).or_default().push(index);
                // Registration into matching literal buckets happens from the
                // literal side below, which scans the full declaration list
                // regardless of insertion order.
            } else {
                let entry = self
                    .by_domain
                    .entry(declaration.literal_domain.clone())
                    .or_default();
                entry.push(index);
                for (wi, wdecl) in self.declarations.iter().enumerate() {
                    if wi != index
                        && wdecl.domain.is_wildcard()
                        && wdecl.domain.matches(&declaration.literal_domain)
                        && !entry.contains(&wi)
                    {
                        entry.push(wi);
                    }
                }
            }
        }

        if self.had_wildcard {
            WILDCARD_WARNING.call_once(|| {
                tracing::warn!("wildcarded key domain declared; falling back to linear `*` bucket matching");
            });
        }
    }

    /// Candidate declarations for a (lowercased) domain: its literal
    /// bucket, or the synthetic `*` bucket if no literal bucket exists.
    #[must_use]
    pub fn candidates_for(&self, domain: &str) -> &[usize] {
        self.by_domain
            .get(domain)
            .map_or_else(|| self.by_domain.get("*").map_or(&[][..], Vec::as_slice), Vec::as_slice)
    }

    #[must_use]
    pub fn declaration(&self, index: usize) -> &KeyDeclaration {
        &self.declarations[index]
    }

    #[must_use]
    pub fn declarations(&self) -> &[KeyDeclaration] {
        &self.declarations
    }
}

fn parse_rsa_pem(pem: &str) -> Result<rsa::RsaPrivateKey, String> {
    use rsa::pkcs1::DecodeRsaPrivateKey as _;
    use rsa::pkcs8::DecodePrivateKey as _;

    match rsa::RsaPrivateKey::from_pkcs8_pem(pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_error) => rsa::RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|pkcs1_error| format!("{pkcs8_error} (pkcs8); {pkcs1_error} (pkcs1)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY_PEM: &str = include_str!("../testdata/test-1024.pem");

    #[test]
    fn rejects_empty_domain() {
        let mut store = KeyStore::new();
        let err = store
            .declare_key("", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap_err();
        assert!(matches!(err, DeclareError::EmptyDomain));
    }

    #[test]
    fn rejects_duplicate_selector_on_same_domain() {
        let mut store = KeyStore::new();
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        let err = store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap_err();
        assert!(matches!(err, DeclareError::DuplicateSelector { .. }));
    }

    #[test]
    fn postprocess_indexes_literal_and_wildcard_domains() {
        let mut store = KeyStore::new();
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store
            .declare_key("*.example.net", "wild", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store.postprocess();

        assert_eq!(store.candidates_for("example.org"), &[0]);
        assert_eq!(store.candidates_for("mail.example.net"), &[1]);
        assert_eq!(store.candidates_for("unknown.test"), &[1]);
    }

    #[test]
    fn postprocess_is_idempotent() {
        let mut store = KeyStore::new();
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store.postprocess();
        let first: Vec<_> = store.candidates_for("example.org").to_vec();
        store.postprocess();
        let second: Vec<_> = store.candidates_for("example.org").to_vec();
        assert_eq!(first, second);
    }
}
