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

//! One hashing interface over the SHA-2, SHA-3 and Keccak families.

use core::fmt;
use core::str::FromStr;

use digest::DynDigest;

use crate::errors::{EcdsaError, SignatureError};

/// Hash algorithm selector.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HashType {
    /// SHA-224
    Sha2_224,
    /// SHA-256
    Sha2_256,
    /// SHA-384
    Sha2_384,
    /// SHA-512
    Sha2_512,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// Keccak-256, the pre-standard padding used for Ethereum style addresses
    Keccak256,
    /// Keccak-512
    Keccak512,
}

impl HashType {
    /// Digest size in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashType::Sha2_224 | HashType::Sha3_224 => 28,
            HashType::Sha2_256 | HashType::Sha3_256 | HashType::Keccak256 => 32,
            HashType::Sha2_384 | HashType::Sha3_384 => 48,
            HashType::Sha2_512 | HashType::Sha3_512 | HashType::Keccak512 => 64,
        }
    }

    fn name(self) -> &'static str {
        match self {
            HashType::Sha2_224 => "SHA2_224",
            HashType::Sha2_256 => "SHA2_256",
            HashType::Sha2_384 => "SHA2_384",
            HashType::Sha2_512 => "SHA2_512",
            HashType::Sha3_224 => "SHA3_224",
            HashType::Sha3_256 => "SHA3_256",
            HashType::Sha3_384 => "SHA3_384",
            HashType::Sha3_512 => "SHA3_512",
            HashType::Keccak256 => "KECCAK_256",
            HashType::Keccak512 => "KECCAK_512",
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashType {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<HashType, SignatureError> {
        let all = [
            HashType::Sha2_224,
            HashType::Sha2_256,
            HashType::Sha2_384,
            HashType::Sha2_512,
            HashType::Sha3_224,
            HashType::Sha3_256,
            HashType::Sha3_384,
            HashType::Sha3_512,
            HashType::Keccak256,
            HashType::Keccak512,
        ];
        all.iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EcdsaError::UnsupportedAlgorithm(s.to_string()).into())
    }
}

/// A resettable hasher for the selected algorithm.
pub struct Hasher {
    kind: HashType,
    inner: Box<dyn DynDigest + Send + Sync>,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher({})", self.kind)
    }
}

impl Hasher {
    /// A fresh hasher.
    pub fn new(kind: HashType) -> Hasher {
        let inner: Box<dyn DynDigest + Send + Sync> = match kind {
            HashType::Sha2_224 => Box::new(sha2::Sha224::default()),
            HashType::Sha2_256 => Box::new(sha2::Sha256::default()),
            HashType::Sha2_384 => Box::new(sha2::Sha384::default()),
            HashType::Sha2_512 => Box::new(sha2::Sha512::default()),
            HashType::Sha3_224 => Box::new(sha3::Sha3_224::default()),
            HashType::Sha3_256 => Box::new(sha3::Sha3_256::default()),
            HashType::Sha3_384 => Box::new(sha3::Sha3_384::default()),
            HashType::Sha3_512 => Box::new(sha3::Sha3_512::default()),
            HashType::Keccak256 => Box::new(sha3::Keccak256::default()),
            HashType::Keccak512 => Box::new(sha3::Keccak512::default()),
        };
        Hasher { kind, inner }
    }

    /// The algorithm behind this hasher.
    pub fn kind(&self) -> HashType {
        self.kind
    }

    /// Absorb more input.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Digest everything absorbed so far and start over.
    pub fn finalize_reset(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().into_vec()
    }

    /// Digest of `msg`; previously absorbed input is discarded first.
    pub fn hash(&mut self, msg: &[u8]) -> Vec<u8> {
        self.inner.reset();
        self.inner.update(msg);
        self.finalize_reset()
    }

    /// Digest of the concatenation of `msgs`.
    pub fn batch_hash(&mut self, msgs: &[&[u8]]) -> Vec<u8> {
        self.inner.reset();
        for msg in msgs {
            self.inner.update(msg);
        }
        self.finalize_reset()
    }
}

/// Keccak-256 of the concatenation of `parts`.
pub(crate) fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = <sha3::Keccak256 as sha3::Digest>::new();
    for part in parts {
        sha3::Digest::update(&mut h, part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&sha3::Digest::finalize(h));
    out
}

/// SHA-512 of the concatenation of `parts`.
pub(crate) fn sha512(parts: &[&[u8]]) -> [u8; 64] {
    let mut h = <sha2::Sha512 as sha2::Digest>::new();
    for part in parts {
        sha2::Digest::update(&mut h, part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&sha2::Digest::finalize(h));
    out
}
