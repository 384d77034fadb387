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

use base64::Engine as _;

use crate::algorithm::HashAlgorithm;
use crate::error::SignError;
use crate::select::{select, SelectQuery};
use crate::store::KeyStore;

/// The result of a successful `sign` request: the raw signature bytes plus
/// the selected declaration's authoritative `d`/`s`, which the dispatcher
/// echoes back per spec §4.7 ("emit them... together with the key's d and
/// s") rather than the query's own casing.
#[derive(Debug, Clone)]
pub struct Signed {
    pub d: String,
    pub s: String,
    pub signature: Vec<u8>,
}

/// The Signer (C7). Looks up `(d, s)` via the Key Selector with no `a`/`i`
/// filtering (selection already happened during `choose_key`), then
/// produces a PKCS#1 v1.5 signature over the already-hashed `digest`.
///
/// All four request attributes are validated here: a missing or empty one
/// yields [`SignError::MissingAttribute`], an unrecognized `digest_alg`
/// yields [`SignError::UnsupportedDigestAlgorithm`], per spec §4.5.
///
/// # Errors
///
/// Returns [`SignError::MissingAttribute`] if any of `d`, `s`, `digest_alg`,
/// `digest` is absent or empty, [`SignError::UnsupportedDigestAlgorithm`] if
/// `digest_alg` is not a recognized hash name, [`SignError::NoKeyAvailable`]
/// if no declaration matches `(d, s)`, [`SignError::Base64`] if `digest` is
/// not valid Base64, or [`SignError::Rsa`] if the RSA operation itself
/// fails.
pub fn sign(
    store: &KeyStore,
    d: Option<&str>,
    s: Option<&str>,
    digest_alg: Option<&str>,
    digest_b64: Option<&str>,
) -> Result<Signed, SignError> {
    let d = non_empty(d, "d")?;
    let s = non_empty(s, "s")?;
    let digest_alg = non_empty(digest_alg, "digest_alg")?;
    let digest_b64 = non_empty(digest_b64, "digest")?;

    let digest_alg: HashAlgorithm = digest_alg
        .parse()
        .map_err(|_| SignError::UnsupportedDigestAlgorithm(digest_alg.to_owned()))?;

    let query = SelectQuery {
        d,
        s: Some(s),
        a: None,
        i: None,
    };
    let selected = select(store, &query).ok_or_else(|| SignError::NoKeyAvailable {
        d: d.to_owned(),
        s: s.to_owned(),
    })?;

    let digest = base64::engine::general_purpose::STANDARD
        .decode(digest_b64)
        .map_err(|source| SignError::Base64 { source })?;

    let signature = selected.declaration.key.sign(digest_alg, &digest)?;

    Ok(Signed {
        d: selected.declaration.literal_domain.clone(),
        s: selected.declaration.selector.clone(),
        signature,
    })
}

fn non_empty<'a>(value: Option<&'a str>, attribute: &'static str) -> Result<&'a str, SignError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SignError::MissingAttribute(attribute)),
    }
}

#[must_use]
pub fn encode_signature(signature: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::KeySource;
    use base64::Engine as _;
    use pretty_assertions::assert_eq;
    use sha2::Digest as _;

    const TEST_KEY_PEM: &str = include_str!("../testdata/test-1024.pem");
    const TEST_PUB_PEM: &str = include_str!("../testdata/test-1024.pub.pem");

    #[test]
    fn signs_and_verifies_round_trip() {
        let mut store = KeyStore::new();
        store
            .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
            .unwrap();
        store.postprocess();

        let digest = sha2::Sha256::digest(b"hello\n");
        let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

        let signed = sign(
            &store,
            Some("example.org"),
            Some("sel1"),
            Some("sha256"),
            Some(&digest_b64),
        )
        .unwrap();
        assert_eq!(signed.d, "example.org");
        assert_eq!(signed.s, "sel1");
        assert_eq!(signed.signature.len(), 128);

        use rsa::pkcs8::DecodePublicKey as _;
        let public_key = rsa::RsaPublicKey::from_public_key_pem(TEST_PUB_PEM).unwrap();
        rsa::Pkcs1v15Sign::new::<sha2::Sha256>()
            .verify(&public_key, &digest, &signed.signature)
            .unwrap();
    }

    #[test]
    fn fails_with_no_key_available_for_unknown_pair() {
        let store = KeyStore::new();
        let err = sign(
            &store,
            Some("unknown.test"),
            Some("anything"),
            Some("sha256"),
            Some("aGVsbG8="),
        )
        .unwrap_err();
        assert!(matches!(err, SignError::NoKeyAvailable { .. }));
    }

    #[test]
    fn fails_with_missing_attribute_when_digest_is_empty() {
        let store = KeyStore::new();
        let err = sign(&store, Some("example.org"), Some("sel1"), Some("sha256"), Some("")).unwrap_err();
        assert!(matches!(err, SignError::MissingAttribute("digest")));
    }

    #[test]
    fn fails_with_missing_attribute_when_d_is_absent() {
        let store = KeyStore::new();
        let err = sign(&store, None, Some("sel1"), Some("sha256"), Some("aGVsbG8=")).unwrap_err();
        assert!(matches!(err, SignError::MissingAttribute("d")));
    }

    #[test]
    fn fails_with_unsupported_digest_algorithm() {
        let store = KeyStore::new();
        let err = sign(
            &store,
            Some("example.org"),
            Some("sel1"),
            Some("sha512"),
            Some("aGVsbG8="),
        )
        .unwrap_err();
        assert!(matches!(err, SignError::UnsupportedDigestAlgorithm(ref alg) if alg == "sha512"));
    }
}
