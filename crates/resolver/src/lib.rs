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

//! The Sender-Options Resolver (C3): derives query keys from a candidate
//! mailbox, walks an ordered list of tag-maps, and merges matching
//! signature-tag defaults before handing the result to the Key Selector.

#![forbid(unsafe_code)]

mod candidate;
mod querykeys;
mod resolve;
mod tagmap;

pub use candidate::Candidate;
pub use querykeys::query_keys;
pub use resolve::{resolve, Resolution};
pub use tagmap::{default_catchall, TagEntry, TagMap};
