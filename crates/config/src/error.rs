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

/// Fatal, startup-time configuration errors (spec §7): these abort the
/// daemon before it binds any socket.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration path {0:?} has no parent directory")]
    InvalidParentDirectory(std::path::PathBuf),
    #[error("cannot read configuration file {0:?}: {1}")]
    FileOpen(std::path::PathBuf, #[source] std::io::Error),
    #[error("cannot parse configuration script: {0}")]
    Parse(#[from] rhai::ParseError),
    #[error("cannot run configuration script: {0}")]
    Eval(#[from] Box<rhai::EvalAltResult>),
    #[error("cannot serialize the `daemon` settings object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid `daemon` settings object: {0}")]
    Deserialize(#[from] serde_path_to_error::Error<serde_json::Error>),
}
