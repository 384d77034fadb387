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

//! The Connection Handler (C5), Request Dispatcher (C6), and Daemon
//! Harness (C8): everything `dkimoracled`'s `main.rs` wires together. Kept
//! as a library, rather than folded into the binary, so the integration
//! tests in `tests/` can drive a real server over a loopback socket.

pub mod connection;
pub mod dispatch;
pub mod logging;
pub mod privilege;
pub mod server;
