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

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dkimoracle_keys::{KeySource, KeyStore};
use dkimoracle_resolver::TagMap;

use crate::convert;

/// Everything the configuration script builds by calling `dkim_key(...)`
/// and `sender_map(...)` in order, per spec §4.11 and §3's "insertion
/// order is first-match wins" invariant.
#[derive(Debug, Default)]
pub struct Accumulator {
    pub store: KeyStore,
    pub tagmaps: Vec<TagMap>,
}

pub type SharedAccumulator = Arc<Mutex<Accumulator>>;

/// Register `dkim_key` and `sender_map` against `engine`, both closing
/// over `accumulator` so repeated calls append in script order. `base_dir`
/// resolves relative key file paths against the configuration script's
/// directory, mirroring the teacher's `with_path`/config-dir resolution.
pub fn register(engine: &mut rhai::Engine, accumulator: &SharedAccumulator, base_dir: PathBuf) {
    let key_accumulator = Arc::clone(accumulator);
    engine.register_fn(
        "dkim_key",
        move |domain: String, selector: String, keyfile: String, options: rhai::Map| -> Result<(), Box<rhai::EvalAltResult>> {
            let record = convert::record_from_options(&options);
            let path = resolve_key_path(&base_dir, &keyfile);

            let mut accumulator = key_accumulator.lock().expect("config accumulator poisoned");
            accumulator
                .store
                .declare_key(&domain, &selector, KeySource::File(&path), record)
                .map_err(|source| -> Box<rhai::EvalAltResult> {
                    format!("dkim_key({domain:?}, {selector:?}, {keyfile:?}): {source}").into()
                })
        },
    );

    let map_accumulator = Arc::clone(accumulator);
    engine.register_fn("sender_map", move |table: rhai::Map| {
        let mut tagmap = TagMap::new();
        for (lookup_key, value) in &table {
            if let Some(entry_map) = value.clone().try_cast::<rhai::Map>() {
                tagmap.insert(lookup_key.to_string(), convert::tag_entry_from_map(&entry_map));
            }
        }
        map_accumulator
            .lock()
            .expect("config accumulator poisoned")
            .tagmaps
            .push(tagmap);
    });
}

fn resolve_key_path(base_dir: &Path, keyfile: &str) -> PathBuf {
    let path = Path::new(keyfile);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
