// Copyright 2019 Stichting Organism
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//
// Ed25519, collective Ed25519 and multi-curve ECDSA
//

// Modified From the hard work off:
// Authors:
// - Isis Agora Lovecruft <isis@patternsinthevoid.net>
// - Jeff Burdges <jeff@web3.foundation>
// - The Tari Project Authors

//Modeled from
//https://github.com/dalek-cryptography/ed25519-dalek/blob/master/src/ed25519.rs

//Useful links:
//https://tools.ietf.org/html/rfc8032
//https://github.com/dedis/cothority/tree/master/cosi
//https://www.secg.org/sec1-v2.pdf

//! Signature schemes over Edwards25519 and the Weierstrass curves.
//!
//! * [`PrivateKey::sign`] / [`PublicKey::verify`]: RFC 8032 Ed25519.
//! * [`cosign`]: a leader and a set of witnesses produce one Ed25519-style
//!   signature that records which of them took part.
//! * [`ecdsa`]: secp256k1 with recoverable signatures and addresses, and
//!   the NIST curves P-256, P-384 and P-521.

#[macro_use]
mod ser;

mod errors;
pub use errors::{from_cosign, from_ecdsa, CosignError, EcdsaError, InternalError, SignatureError};

pub mod curve25519;
pub mod hash;
pub mod pool;

pub mod keys;
pub mod signature;

pub mod cosign;
pub mod ecdsa;

// Export everything public in ecsign.
pub use crate::keys::*;
pub use crate::signature::{Signature, SIGNATURE_LENGTH};

pub use crate::cosign::{
    agg_verify, Commitment, CosignLeader, Cosigner, Leader, MaskBit, SignaturePart, Witness,
    AGGREGATE_PUBLIC_KEY_LENGTH, COMMITMENT_LENGTH,
};
pub use crate::ecdsa::{AlgorithmOption, Ecdsa, EcdsaPrivateKey, EcdsaPublicKey};
pub use crate::hash::{HashType, Hasher};
pub use crate::pool::ScratchPool;
