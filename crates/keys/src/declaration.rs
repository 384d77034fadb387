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

use std::sync::Arc;

use regex::Regex;

use crate::record::Record;
use crate::PrivateKey;

/// A signing domain as declared: either a literal lowercased name, or a
/// pattern derived from a `*`-wildcarded domain. Kept separate from the
/// literal index per the design note on wildcard key domains.
#[derive(Debug, Clone)]
pub enum DomainMatcher {
    Literal(String),
    Pattern(Regex),
}

impl DomainMatcher {
    /// Parse a declared domain. A domain containing `*` is compiled into an
    /// anchored regular expression with successive `*`s collapsed into a
    /// single `.*`; anything else is a literal match.
    pub fn parse(domain: &str) -> Result<Self, regex::Error> {
        let domain = domain.to_lowercase();
        if !domain.contains('*') {
            return Ok(Self::Literal(domain));
        }

        let mut pattern = String::from("^");
        let mut prev_was_star = false;
        for ch in domain.chars() {
            if ch == '*' {
                if !prev_was_star {
                    pattern.push_str(".*");
                }
                prev_was_star = true;
            } else {
                prev_was_star = false;
                pattern.push_str(&regex::escape(&ch.to_string()));
            }
        }
        pattern.push('$');
        Ok(Self::Pattern(Regex::new(&pattern)?))
    }

    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == candidate,
            Self::Pattern(re) => re.is_match(candidate),
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

/// An ordered Key Store entry: a signing domain, selector, the shared
/// private key it refers to, and the public-record constraints attached to
/// it.
#[derive(Debug, Clone)]
pub struct KeyDeclaration {
    pub domain: DomainMatcher,
    pub literal_domain: String,
    pub selector: String,
    pub key: Arc<PrivateKey>,
    pub record: Record,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_domain_matches_itself_only() {
        let matcher = DomainMatcher::parse("example.org").unwrap();
        assert!(matcher.matches("example.org"));
        assert!(!matcher.matches("sub.example.org"));
        assert!(!matcher.is_wildcard());
    }

    #[test]
    fn wildcard_domain_compiles_to_anchored_pattern() {
        let matcher = DomainMatcher::parse("*.example.org").unwrap();
        assert!(matcher.matches("mail.example.org"));
        assert!(!matcher.matches("example.org"));
        assert!(!matcher.matches("mail.example.org.evil"));
        assert!(matcher.is_wildcard());
    }

    #[test]
    fn successive_stars_collapse() {
        let matcher = DomainMatcher::parse("**.example.org").unwrap();
        assert!(matcher.matches("a.b.example.org"));
    }
}
