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

//! Configuration loading (ambient stack, spec §4.11): evaluates an rhai
//! script once at startup for its ordered `dkim_key(...)`/`sender_map(...)`
//! side effects, then reads back a top-level `daemon` object into
//! [`DaemonSettings`] — the same `Config: from_rhai_file` idiom the
//! teacher uses, adapted to a side-effecting rather than data-transforming
//! script.

#![forbid(unsafe_code)]

mod accumulator;
mod convert;
mod error;
mod settings;

use std::path::Path;
use std::sync::{Arc, Mutex};

pub use dkimoracle_keys::KeyStore;
pub use dkimoracle_resolver::TagMap;
pub use error::ConfigError;
pub use settings::DaemonSettings;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything the daemon needs at startup: process-level settings, the
/// populated Key Store, and the ordered list of sender tag-maps.
pub struct LoadedConfig {
    pub settings: DaemonSettings,
    pub store: KeyStore,
    pub tagmaps: Vec<TagMap>,
}

/// Load and evaluate the rhai configuration script at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, the script fails to
/// parse or run (including any `dkim_key`/`sender_map` call raising an
/// error), or the `daemon` object does not deserialize into
/// [`DaemonSettings`].
pub fn load(path: &impl AsRef<Path>) -> ConfigResult<LoadedConfig> {
    let path = path.as_ref();
    let base_dir = path
        .parent()
        .ok_or_else(|| ConfigError::InvalidParentDirectory(path.to_path_buf()))?
        .to_path_buf();

    let script = std::fs::read_to_string(path).map_err(|source| ConfigError::FileOpen(path.to_path_buf(), source))?;

    load_script(&script, base_dir)
}

/// Evaluate an rhai configuration script given directly (used by tests and
/// by [`load`]). `base_dir` resolves relative key file paths and rhai
/// module imports.
///
/// # Errors
///
/// See [`load`].
pub fn load_script(script: &str, base_dir: std::path::PathBuf) -> ConfigResult<LoadedConfig> {
    let accumulator: accumulator::SharedAccumulator = Arc::new(Mutex::new(accumulator::Accumulator::default()));

    let mut engine = rhai::Engine::new();
    engine.set_module_resolver(rhai::module_resolvers::FileModuleResolver::new_with_path_and_extension(
        &base_dir, "rhai",
    ));
    accumulator::register(&mut engine, &accumulator, base_dir);

    let ast = engine.compile(script)?;
    let mut scope = rhai::Scope::new();
    engine.run_ast_with_scope(&mut scope, &ast)?;

    let daemon_dynamic = scope
        .get_value::<rhai::Dynamic>("daemon")
        .unwrap_or_else(|| rhai::Dynamic::from(rhai::Map::new()));
    let json = serde_json::to_string(&daemon_dynamic)?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let settings: DaemonSettings = serde_path_to_error::deserialize(&mut deserializer)?;

    // Drop the engine and its registered closures so the sole remaining
    // `Arc` reference to the accumulator is the one we hold here.
    drop(scope);
    drop(ast);
    drop(engine);
    let accumulator = Arc::try_unwrap(accumulator)
        .unwrap_or_else(|_| panic!("dkimoracle-config: accumulator still shared after engine teardown"));
    let mut accumulator = accumulator.into_inner().expect("config accumulator poisoned");
    accumulator.store.postprocess();

    tracing::info!(
        keys = accumulator.store.declarations().len(),
        tagmaps = accumulator.tagmaps.len(),
        "configuration loaded"
    );

    Ok(LoadedConfig {
        settings,
        store: accumulator.store,
        tagmaps: accumulator.tagmaps,
    })
}
