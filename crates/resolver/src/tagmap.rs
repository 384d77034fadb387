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

/// A partial set of RFC 6376 signature tags plus the pseudo-tag `ttl`
/// (relative expiry seconds, converted to an absolute `x = t + ttl` at
/// sign time), per spec §3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEntry {
    pub tags: HashMap<String, String>,
    pub ttl: Option<u64>,
}

impl TagEntry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// One layer of the Signature Option Map: a lookup key (a full address, a
/// bare domain, a leading-dot parent suffix, or `.` as catchall) mapped to
/// a partial tag set.
pub type TagMap = HashMap<String, TagEntry>;

/// Build the built-in final catchall `{c: "relaxed/simple", a: "rsa-sha256"}`
/// that is always appended after every configured tag-map, per spec §4.3
/// step 3.
#[must_use]
pub fn default_catchall() -> TagEntry {
    TagEntry::new()
        .with_tag("c", "relaxed/simple")
        .with_tag("a", "rsa-sha256")
}
