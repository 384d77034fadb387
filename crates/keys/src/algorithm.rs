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

/// A hash algorithm as it appears in the `h=` public-key-record tag and in
/// the `a=rsa-<hash>` query attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

/// The `<keytype>-<hashalg>` pair carried in the `a` attribute, e.g.
/// `rsa-sha256`. Only RSA keys are in scope for this daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningAlgorithm {
    pub key_type: String,
    pub hash: Option<HashAlgorithm>,
}

impl SigningAlgorithm {
    /// Parse `<keytype>-<hashalg>`, e.g. `rsa-sha256`. A bare keytype with
    /// no hash (`rsa`) leaves `hash` unspecified, matching spec §4.2.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.split_once('-') {
            Some((key_type, hash)) => Self {
                key_type: key_type.to_lowercase(),
                hash: hash.to_lowercase().parse().ok(),
            },
            None => Self {
                key_type: input.to_lowercase(),
                hash: None,
            },
        }
    }
}

impl Default for SigningAlgorithm {
    /// Absent `a` attribute defaults to `rsa` with an unspecified hash.
    fn default() -> Self {
        Self {
            key_type: "rsa".to_owned(),
            hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_keytype_and_hash() {
        let a = SigningAlgorithm::parse("rsa-sha256");
        assert_eq!(a.key_type, "rsa");
        assert_eq!(a.hash, Some(HashAlgorithm::Sha256));
    }

    #[test]
    fn bare_keytype_has_no_hash() {
        let a = SigningAlgorithm::parse("rsa");
        assert_eq!(a.key_type, "rsa");
        assert_eq!(a.hash, None);
    }

    #[test]
    fn default_is_rsa_unspecified() {
        assert_eq!(SigningAlgorithm::default(), SigningAlgorithm::parse("rsa"));
    }
}
