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

use dkimoracle_common::Mailbox;

/// A candidate sender identity offered by the client: a source label
/// (`author`, `envelope`, ...) and an RFC 5321 mailbox, as sent in a
/// `candidate` attribute (spec §6: `<source-label> <quoted-mailbox>`).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub label: String,
    pub mailbox: Mailbox,
}

impl Candidate {
    /// Parse a `candidate` attribute value, e.g. `author Alice <alice@ex.org>`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (label, rest) = raw.trim().split_once(char::is_whitespace)?;
        if label.is_empty() || rest.trim().is_empty() {
            return None;
        }
        Some(Self {
            label: label.to_owned(),
            mailbox: Mailbox::parse(rest.trim()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_label_and_display_name_mailbox() {
        let candidate = Candidate::parse("author Alice <alice@ex.org>").unwrap();
        assert_eq!(candidate.label, "author");
        assert_eq!(candidate.mailbox.to_address(), "alice@ex.org");
    }

    #[test]
    fn parses_label_and_bare_mailbox() {
        let candidate = Candidate::parse("envelope bob@example.org").unwrap();
        assert_eq!(candidate.label, "envelope");
        assert_eq!(candidate.mailbox.to_address(), "bob@example.org");
    }

    #[test]
    fn rejects_missing_mailbox() {
        assert!(Candidate::parse("author").is_none());
    }
}
