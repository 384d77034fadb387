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

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{codec, AttributeMap};

/// Errors surfaced while reading or writing a frame. A malformed attribute
/// line is not one of these — the caller logs and skips it, per spec §4.5.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The peer closed the connection before sending a blank-line
    /// terminator.
    #[error("connection closed mid-request")]
    Eof,
}

/// Read attribute lines until a blank line (CR LF only) terminates the
/// request, accumulating them into an [`AttributeMap`]. Malformed lines are
/// logged and skipped without aborting the connection, per spec §4.5.
///
/// Returns `Ok(None)` if the connection closes cleanly before any line is
/// read (i.e. no partial request was in flight).
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<AttributeMap>, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut attrs = AttributeMap::new();
    let mut saw_any_line = false;
    let mut buf = String::new();

    loop {
        buf.clear();
        let n = reader.read_line(&mut buf).await?;
        if n == 0 {
            return if saw_any_line {
                Err(FrameError::Eof)
            } else {
                Ok(None)
            };
        }

        let line = buf.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(Some(attrs));
        }

        saw_any_line = true;
        match codec::decode_line(line) {
            Ok((name, value)) => attrs.push(name, value),
            Err(error) => tracing::warn!(%line, %error, "skipping malformed attribute line"),
        }
    }
}

/// Write every attribute in `attrs` as a CR LF terminated line, followed by
/// a blank line, then flush.
pub async fn write_frame<W>(writer: &mut W, attrs: &AttributeMap) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let mut out = String::new();
    for (name, value) in attrs.iter() {
        out.push_str(&codec::encode_line(name, value));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    writer.write_all(out.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
