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

//! The Connection Handler (C5): the per-connection request state machine
//! described in spec §4.5 and design note "Idle -> ReadingAttributes ->
//! Dispatching -> WritingResponse -> Idle". Requests on one connection are
//! always served in order (spec §5); across connections no order is
//! guaranteed.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use dkimoracle_keys::KeyStore;
use dkimoracle_protocol::{read_frame, write_frame, FrameError};
use dkimoracle_resolver::TagMap;

use crate::dispatch::dispatch;

/// The read-only state shared by every connection, built once at startup
/// by [`crate::config`] loading and never mutated again (spec §5).
pub struct Shared {
    pub store: KeyStore,
    pub tagmaps: Vec<TagMap>,
}

/// Serve one connection to completion: read a request, dispatch it, write
/// the response, and repeat until the peer disconnects or a write fails.
/// Malformed attribute lines are logged and skipped inside
/// [`read_frame`]; they never end the connection. A write failure or a mid
/// -request disconnect (spec §7 "I/O errors: log, drop connection") ends
/// it here.
pub async fn serve<S>(stream: S, shared: Arc<Shared>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    loop {
        let request = match read_frame(&mut reader).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("connection closed cleanly");
                return;
            }
            Err(FrameError::Eof) => {
                tracing::warn!("connection closed mid-request");
                return;
            }
            Err(FrameError::Io(error)) => {
                tracing::warn!(%error, "i/o error reading request, dropping connection");
                return;
            }
        };

        let response = dispatch(&request, &shared.store, &shared.tagmaps);

        if let Err(error) = write_frame(&mut writer, &response).await {
            tracing::warn!(%error, "i/o error writing response, dropping connection");
            return;
        }
    }
}
