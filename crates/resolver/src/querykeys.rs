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

use dkimoracle_common::{parent_suffixes, Mailbox};

/// Local parts whose `+` is never treated as an extension delimiter,
/// per spec §4.3 step 2: exact special addresses, and the `owner-*` /
/// `*-request` mailing-list conventions.
fn suppresses_extension_split(local_lower: &str) -> bool {
    matches!(local_lower, "postmaster" | "mailer-daemon" | "double-bounce")
        || local_lower.starts_with("owner-")
        || local_lower.ends_with("-request")
}

/// Build the ordered list of query keys derived from `mailbox`, per spec
/// §4.3 step 2, deduplicated while preserving first-occurrence order
/// (invariant 2).
#[must_use]
pub fn query_keys(mailbox: &Mailbox) -> Vec<String> {
    let mut keys = Vec::new();
    let mut push = |key: String| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    // `Mailbox::parse` already lowercases the domain.
    let domain = mailbox.domain();
    let local = mailbox.local();
    let local_lower = local.to_lowercase();

    push(mailbox.to_address());

    let split = if suppresses_extension_split(&local_lower) {
        None
    } else {
        local.split_once('+').filter(|(user, _)| !user.is_empty())
    };

    if let Some((user, ext)) = split {
        push(format!("{user}+{ext}@{domain}"));
        push(format!("{user}@{domain}"));
        push(format!("{user}+{ext}@"));
        push(format!("{user}@"));
    } else {
        push(format!("{local}@{domain}"));
    }

    if !domain.is_empty() {
        push(format!("@{domain}"));
        for suffix in parent_suffixes(domain) {
            push(format!("@{suffix}"));
        }
    }

    keys
}
