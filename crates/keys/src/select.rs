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

use crate::algorithm::SigningAlgorithm;
use crate::declaration::KeyDeclaration;
use crate::store::KeyStore;

/// A query against the Key Selector (C2). `d` is the only required tag.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery<'a> {
    pub d: &'a str,
    pub s: Option<&'a str>,
    pub a: Option<&'a str>,
    pub i: Option<&'a str>,
}

/// The result of a successful selection: the matched declaration plus the
/// domain it was queried under (lowercased).
#[derive(Debug, Clone, Copy)]
pub struct Selected<'a> {
    pub declaration: &'a KeyDeclaration,
}

/// Find the first declaration admitting `query`, per spec §4.2.
#[must_use]
pub fn select<'a>(store: &'a KeyStore, query: &SelectQuery<'_>) -> Option<Selected<'a>> {
    let d = query.d.to_lowercase();
    let algorithm = query.a.map(SigningAlgorithm::parse);

    for &index in store.candidates_for(&d) {
        let declaration = store.declaration(index);
        if admits(declaration, &d, query, algorithm.as_ref()) {
            return Some(Selected { declaration });
        }
    }
    None
}

fn admits(
    declaration: &KeyDeclaration,
    d: &str,
    query: &SelectQuery<'_>,
    algorithm: Option<&SigningAlgorithm>,
) -> bool {
    if !declaration.domain.matches(d) {
        return false;
    }

    if let Some(selector) = query.s {
        if !selector.eq_ignore_ascii_case(&declaration.selector) {
            return false;
        }
    }

    if declaration.record.key_type != "rsa" {
        return false;
    }

    if !declaration.record.accepts_service("email") {
        return false;
    }

    if let Some(algorithm) = algorithm {
        if let Some(wanted_hash) = algorithm.hash {
            if !declaration.record.acceptable_hashes.is_empty()
                && !declaration.record.acceptable_hashes.contains(&wanted_hash)
            {
                return false;
            }
        }
    }

    if let Some(identity) = query.i {
        let (ilocal, idomain) = identity.split_once('@').unwrap_or((identity, ""));
        if !idomain.eq_ignore_ascii_case(d) && declaration.record.forbids_subdomains() {
            return false;
        }
        if !declaration.record.granularity.matches(ilocal) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::{KeySource, KeyStore};
    use pretty_assertions::assert_eq;

    const TEST_KEY_PEM: &str = include_str!("../testdata/test-1024.pem");
    const TEST_KEY_PEM_B: &str = include_str!("../testdata/test-1024-b.pem");

    #[test]
    fn selects_first_matching_declaration_by_hash() {
        use crate::algorithm::HashAlgorithm;

        let mut store = KeyStore::new();
        let mut rec_sha1 = Record::default();
        rec_sha1.acceptable_hashes = vec![HashAlgorithm::Sha1];
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), rec_sha1)
            .unwrap();

        let mut rec_sha256 = Record::default();
        rec_sha256.acceptable_hashes = vec![HashAlgorithm::Sha256];
        store
            .declare_key("example.org", "sel2", KeySource::Inline(TEST_KEY_PEM_B), rec_sha256)
            .unwrap();
        store.postprocess();

        let query = SelectQuery {
            d: "example.org",
            a: Some("rsa-sha256"),
            ..Default::default()
        };
        let selected = select(&store, &query).unwrap();
        assert_eq!(selected.declaration.selector, "sel2");

        let query = SelectQuery {
            d: "example.org",
            a: Some("rsa-sha1"),
            ..Default::default()
        };
        let selected = select(&store, &query).unwrap();
        assert_eq!(selected.declaration.selector, "sel1");
    }

    #[test]
    fn no_match_for_unknown_domain_without_wildcard() {
        let mut store = KeyStore::new();
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store.postprocess();

        let query = SelectQuery {
            d: "unknown.test",
            ..Default::default()
        };
        assert!(select(&store, &query).is_none());
    }

    #[test]
    fn subdomain_identity_rejected_when_flag_forbids_it() {
        let mut store = KeyStore::new();
        let mut record = Record::default();
        record.flags.push("s".to_owned());
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), record)
            .unwrap();
        store.postprocess();

        let query = SelectQuery {
            d: "example.org",
            i: Some("user@mail.example.org"),
            ..Default::default()
        };
        assert!(select(&store, &query).is_none());
    }

    #[test]
    fn wildcard_bucket_used_when_no_literal_match() {
        let mut store = KeyStore::new();
        store
            .declare_key("*.example.net", "wild", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store.postprocess();

        let query = SelectQuery {
            d: "mail.example.net",
            ..Default::default()
        };
        assert!(select(&store, &query).is_some());
    }
}
