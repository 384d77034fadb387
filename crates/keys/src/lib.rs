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

//! The Key Store (C1), Key Selector (C2), and Signer (C7): declaring and
//! indexing DKIM private keys, selecting among them under a set of
//! request constraints, and producing RSA signatures over a pre-computed
//! digest.

#![forbid(unsafe_code)]

mod algorithm;
mod declaration;
mod error;
mod private_key;
mod record;
mod select;
mod sign;
mod store;

pub use algorithm::{HashAlgorithm, SigningAlgorithm};
pub use declaration::{DomainMatcher, KeyDeclaration};
pub use error::{DeclareError, SignError};
pub use private_key::{identify_file, KeyIdentity, PrivateKey};
pub use record::{Granularity, Record};
pub use select::{select, SelectQuery, Selected};
pub use sign::{encode_signature, sign, Signed};
pub use store::{KeySource, KeyStore};
