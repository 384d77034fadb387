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

//! `dkimoracled`: the DKIM signing oracle daemon (spec §1). Loads an rhai
//! configuration script declaring keys and sender tag-maps, then serves
//! `choose_key`/`sign` requests over the AM.PDP-alike wire protocol.

use std::sync::Arc;

use clap::Parser;

use dkimoracle_daemon::connection::Shared;
use dkimoracle_daemon::{logging, server};

/// Command-line arguments for `dkimoracled`.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the rhai configuration script.
    #[arg(short, long)]
    config: String,

    /// Stay attached to the controlling terminal instead of daemonizing.
    ///
    /// The reference daemon forks into the background by default; this
    /// implementation always runs in the foreground (no process is ever
    /// `fork()`-ed), so this flag exists for CLI compatibility but is
    /// currently always on.
    #[arg(long)]
    foreground: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let _ = args.foreground;

    let loaded = match dkimoracle_config::load(&args.config) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("dkimoracled: cannot load configuration {:?}: {error}", args.config);
            std::process::exit(1);
        }
    };

    logging::init(&loaded.settings);

    let shared = Arc::new(Shared {
        store: loaded.store,
        tagmaps: loaded.tagmaps,
    });

    if let Err(error) = server::run(loaded.settings, shared).await {
        tracing::error!(%error, "dkimoracled exiting after a fatal startup error");
        std::process::exit(1);
    }
}
