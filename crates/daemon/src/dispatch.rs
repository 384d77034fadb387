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

//! The Request Dispatcher (C6): routes a decoded request to the
//! Sender-Options Resolver + Key Selector (`choose_key`) or the Signer
//! (`sign`), per spec §4.6.

use std::collections::HashMap;

use dkimoracle_keys::KeyStore;
use dkimoracle_protocol::AttributeMap;
use dkimoracle_resolver::{resolve, Candidate, TagMap};

/// Dispatch one fully-buffered request and build its response, per spec
/// §4.6: `request_id`/`log_id` are echoed first if present, then the
/// request-specific attributes.
#[must_use]
pub fn dispatch(request: &AttributeMap, store: &KeyStore, tagmaps: &[TagMap]) -> AttributeMap {
    let mut response = AttributeMap::new();
    if let Some(request_id) = request.get("request_id") {
        response.push("request_id", request_id);
    }
    if let Some(log_id) = request.get("log_id") {
        response.push("log_id", log_id);
    }

    match request.get("request") {
        Some("choose_key") => dispatch_choose_key(request, store, tagmaps, &mut response),
        Some("sign") => dispatch_sign(request, store, &mut response),
        _ => response.push("reason", "unknown request type"),
    }

    response
}

/// `choose_key`: parse `candidate` attributes into [`Candidate`]s, parse
/// `sig.<tag>` overrides, resolve sender options (C3) and select a key
/// (C2), per spec §4.3/§4.6.
fn dispatch_choose_key(request: &AttributeMap, store: &KeyStore, tagmaps: &[TagMap], response: &mut AttributeMap) {
    let candidates: Vec<Candidate> = request
        .get_all("candidate")
        .iter()
        .filter_map(|raw| Candidate::parse(raw))
        .collect();

    let overrides: HashMap<String, String> = request
        .iter()
        .filter_map(|(name, value)| name.strip_prefix("sig.").map(|tag| (tag.to_owned(), value.to_owned())))
        .collect();

    let Some(resolution) = resolve(&candidates, tagmaps, &overrides, store) else {
        return;
    };

    let mut tags: Vec<(&String, &String)> = resolution.tags.iter().collect();
    tags.sort_by_key(|(tag, _)| tag.as_str());
    for (tag, value) in tags {
        if !value.is_empty() {
            response.push(format!("sig.{tag}"), value.clone());
        }
    }

    response.push(
        "chosen_candidate",
        format!("{} {}", resolution.source_label, resolution.chosen_address),
    );
}

/// `sign`: validate the four required attributes, look up the key by
/// `(d, s)` (C2, no `a`/`i` filtering) and produce a signature (C7), per
/// spec §4.7. Every failure path here is a `reason=...` response, never a
/// propagated error, per spec §7.
fn dispatch_sign(request: &AttributeMap, store: &KeyStore, response: &mut AttributeMap) {
    match dkimoracle_keys::sign(
        store,
        request.get("d"),
        request.get("s"),
        request.get("digest_alg"),
        request.get("digest"),
    ) {
        Ok(signed) => {
            response.push("d", signed.d);
            response.push("s", signed.s);
            response.push("b", dkimoracle_keys::encode_signature(&signed.signature));
        }
        Err(error) => response.push("reason", sign_error_reason(&error)),
    }
}

/// Render a [`dkimoracle_keys::SignError`] as the `reason` text spec §4.7
/// and §7 specify. `MissingAttribute` and `NoKeyAvailable` have their own
/// fixed wording; everything else is the generic `cannot sign: <detail>`.
fn sign_error_reason(error: &dkimoracle_keys::SignError) -> String {
    use dkimoracle_keys::SignError;
    match error {
        SignError::MissingAttribute(which) => format!("cannot sign, {which}"),
        SignError::NoKeyAvailable { .. } => "cannot sign, signing key not available".to_owned(),
        other => format!("cannot sign: {other}"),
    }
}
