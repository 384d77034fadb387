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

//! Shared, dependency-light types used across the `dkimoracle` crates:
//! mailbox unquoting and domain-suffix iteration.

#![forbid(unsafe_code)]

mod address;
mod domain;

pub use address::Mailbox;
pub use domain::parent_suffixes;
