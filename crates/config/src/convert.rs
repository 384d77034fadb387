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

use dkimoracle_keys::{HashAlgorithm, Record};
use dkimoracle_resolver::TagEntry;

/// Look up `key` in an rhai map by value rather than by `Borrow<str>`,
/// since `rhai::Map`'s key type does not reliably support `&str` lookups
/// across rhai's feature combinations.
fn map_get<'a>(map: &'a rhai::Map, key: &str) -> Option<&'a rhai::Dynamic> {
    map.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
}

fn dynamic_to_string(value: &rhai::Dynamic) -> Option<String> {
    match value.clone().into_string() {
        Ok(s) => Some(s),
        Err(_) if value.is_int() => Some(value.as_int().expect("checked is_int").to_string()),
        Err(_) => None,
    }
}

/// Accept either an rhai array of strings or a single colon-separated
/// string, matching how `h`/`s`/`t` are written in amavisd-new-style
/// configuration (RFC 6376 tags are themselves colon-separated lists).
fn dynamic_to_list(value: &rhai::Dynamic) -> Vec<String> {
    if let Some(array) = value.clone().try_cast::<rhai::Array>() {
        return array.iter().filter_map(dynamic_to_string).collect();
    }
    match dynamic_to_string(value) {
        Some(s) => s.split(':').map(str::to_owned).filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    }
}

/// Build a [`Record`] from the `options` map passed to `dkim_key(...)`,
/// covering `v`, `g`, `h`, `s`, `t`, `n` (spec §3, §4.1). `k` is ignored:
/// the Key Store always normalizes it to `rsa` when a file is loaded.
#[must_use]
pub fn record_from_options(options: &rhai::Map) -> Record {
    let mut record = Record::default();

    if let Some(v) = map_get(options, "v").and_then(dynamic_to_string) {
        record.version = v;
    }

    if let Some(g) = map_get(options, "g").and_then(dynamic_to_string) {
        record.granularity = dkimoracle_keys::Granularity::parse(&g);
    }

    if let Some(h) = map_get(options, "h") {
        record.acceptable_hashes = dynamic_to_list(h)
            .iter()
            .filter_map(|name| name.to_lowercase().parse::<HashAlgorithm>().ok())
            .collect();
    }

    if let Some(s) = map_get(options, "s") {
        record.service_types = dynamic_to_list(s);
    }

    if let Some(t) = map_get(options, "t") {
        record.flags = dynamic_to_list(t);
    }

    if let Some(n) = map_get(options, "n").and_then(dynamic_to_string) {
        record.set_notes(&n);
    }

    record
}

/// Build a [`TagEntry`] from one `sender_map(...)` table value: every
/// string-valued key becomes a signature tag, `ttl` (an integer) becomes
/// the pseudo-tag carried separately on [`TagEntry`].
#[must_use]
pub fn tag_entry_from_map(map: &rhai::Map) -> TagEntry {
    let mut entry = TagEntry::new();
    for (key, value) in map {
        if key.as_str() == "ttl" {
            if let Some(ttl) = value.as_int().ok().and_then(|n| u64::try_from(n).ok()) {
                entry = entry.with_ttl(ttl);
            }
            continue;
        }
        if let Some(value) = dynamic_to_string(value) {
            entry = entry.with_tag(key.as_str(), value);
        }
    }
    entry
}
