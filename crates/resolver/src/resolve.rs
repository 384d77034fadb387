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
use std::time::{SystemTime, UNIX_EPOCH};

use dkimoracle_keys::{select, KeyStore, SelectQuery};

use crate::candidate::Candidate;
use crate::querykeys::query_keys;
use crate::tagmap::{default_catchall, TagMap};

/// The outcome of a successful `choose_key` resolution: the candidate that
/// was chosen, and the final `sig.<tag>` set to emit (with `d`/`s` already
/// authoritative from the selected key).
#[derive(Debug, Clone)]
pub struct Resolution {
    pub source_label: String,
    pub chosen_address: String,
    pub tags: HashMap<String, String>,
}

/// Walk `candidates` in order, resolving sender options against `tagmaps`
/// and attempting key selection for each, per spec §4.3.
///
/// For each candidate, tag-maps are merged first ("more specific wins":
/// first value seen per tag, spec §4.3 step 3), then any request-level
/// `sig.<tag>` override fills a tag the tag-maps left unset, and finally
/// the built-in catchall (`c=relaxed/simple`, `a=rsa-sha256`) fills
/// whatever is still missing. Key selection (C2) is attempted with this
/// fully merged set, so a request's `sig.a`/`sig.s`/`sig.i` can steer
/// which declaration is chosen — this is what lets a bare request (no
/// sender tag-maps configured) pick between two keys of the same domain
/// by hash algorithm, per spec §8 scenario S3.
#[must_use]
pub fn resolve(
    candidates: &[Candidate],
    tagmaps: &[TagMap],
    overrides: &HashMap<String, String>,
    store: &KeyStore,
) -> Option<Resolution> {
    for candidate in candidates {
        let keys = query_keys(&candidate.mailbox);
        let mut merged: HashMap<String, String> = HashMap::new();
        let mut ttl: Option<u64> = None;

        for tagmap in tagmaps {
            for key in &keys {
                if let Some(entry) = tagmap.get(key) {
                    apply_first_wins(&mut merged, entry_to_tags(entry).iter());
                    if ttl.is_none() {
                        ttl = entry.ttl;
                    }
                }
            }
        }

        for (tag, value) in overrides {
            if tag == "ttl" {
                if ttl.is_none() {
                    ttl = value.parse().ok();
                }
                continue;
            }
            merged.entry(tag.clone()).or_insert_with(|| value.clone());
        }

        let catchall = default_catchall();
        apply_first_wins(&mut merged, entry_to_tags(&catchall).iter());

        if !merged.contains_key("d") {
            let domain = candidate.mailbox.domain().trim_start_matches('@');
            merged.insert("d".to_owned(), domain.to_owned());
        }

        let d = merged.get("d").cloned().unwrap_or_default();
        let s = merged.get("s").cloned();
        let a = merged.get("a").cloned();
        let i = merged.get("i").cloned();

        let query = SelectQuery {
            d: &d,
            s: s.as_deref(),
            a: a.as_deref(),
            i: i.as_deref(),
        };

        if let Some(selected) = select(store, &query) {
            merged.insert("d".to_owned(), d.clone());
            merged.insert("s".to_owned(), selected.declaration.selector.clone());

            // Convert the `ttl` pseudo-tag to the RFC 6376 `x=` absolute
            // expiry a verifier actually understands, per spec §3: `x = t
            // + ttl`. `t` is taken from whatever was already merged (a
            // tag-map or the request may set it); absent that, "sign time"
            // is now.
            if let Some(ttl) = ttl {
                let t = merged.get("t").and_then(|v| v.parse::<u64>().ok()).unwrap_or_else(now_unix);
                merged.entry("x".to_owned()).or_insert_with(|| (t + ttl).to_string());
            }

            return Some(Resolution {
                source_label: candidate.label.clone(),
                chosen_address: candidate.mailbox.to_address(),
                tags: merged,
            });
        }
    }
    None
}

/// The entry's regular signature tags, as `(tag, value)` pairs. The `ttl`
/// pseudo-tag is not one of these — it is carried on [`TagEntry::ttl`] and
/// handled separately by [`resolve`], which converts it to an absolute
/// `x=` tag rather than emitting it verbatim.
fn entry_to_tags(entry: &crate::tagmap::TagEntry) -> Vec<(String, String)> {
    entry.tags.clone().into_iter().collect()
}

fn apply_first_wins<'a>(merged: &mut HashMap<String, String>, entries: impl Iterator<Item = &'a (String, String)>) {
    for (tag, value) in entries {
        merged.entry(tag.clone()).or_insert_with(|| value.clone());
    }
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}
