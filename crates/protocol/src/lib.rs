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

//! The AM.PDP-alike wire protocol: attribute encoding, line decoding, and
//! blank-line request/response framing.

#![forbid(unsafe_code)]

mod attributes;
mod codec;
mod frame;

pub use attributes::AttributeMap;
pub use codec::{decode_line, encode_line, DecodeError};
pub use frame::{read_frame, write_frame, FrameError};
