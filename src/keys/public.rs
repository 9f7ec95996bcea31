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

//! Ed25519 Public Key

use core::fmt::Debug;

use crate::curve25519::EdwardsPoint;
use crate::errors::{InternalError, SignatureError};

/// The length of an Ed25519 `PublicKey`, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// An Ed25519 public key.
///
/// Keeps both the encoding it was built from and the decoded point.
#[derive(Copy, Clone)]
pub struct PublicKey {
    pub(crate) compressed: [u8; PUBLIC_KEY_LENGTH],
    pub(crate) point: EdwardsPoint,
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "PublicKey({:?})", &self.compressed)
    }
}

impl PublicKey {
    pub(crate) const DESCRIPTION: &'static str = "An Ed25519 public key as 32 bytes.";

    /// Convert this public key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.compressed
    }

    /// View this public key as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.compressed
    }

    /// Access the point form
    pub fn as_point(&self) -> &EdwardsPoint {
        &self.point
    }

    /// Compress a point into a `PublicKey`.
    pub fn from_point(point: EdwardsPoint) -> PublicKey {
        PublicKey {
            compressed: point.compress(),
            point,
        }
    }

    /// Construct a `PublicKey` from a slice of bytes.
    ///
    /// The bytes must be the canonical encoding of a curve point.
    ///
    /// # Example
    ///
    /// ```
    /// # extern crate ecsign;
    /// #
    /// use ecsign::*;
    ///
    /// # fn doctest() -> Result<PublicKey, SignatureError> {
    /// let public_key_bytes: [u8; PUBLIC_KEY_LENGTH] = [
    ///    215,  90, 152,   1, 130, 177,  10, 183, 213,  75, 254, 211, 201, 100,   7,  58,
    ///     14, 225, 114, 243, 218, 166,  35,  37, 175,   2,  26, 104, 247,   7,  81,  26];
    ///
    /// let public_key = PublicKey::from_bytes(&public_key_bytes)?;
    /// #
    /// # Ok(public_key)
    /// # }
    /// #
    /// # fn main() {
    /// #     assert!(doctest().is_ok());
    /// # }
    /// ```
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `PublicKey` or whose error value
    /// is a `SignatureError` describing the error that occurred.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicKey, SignatureError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(SignatureError::from(InternalError::BytesLengthError {
                name: "PublicKey",
                description: PublicKey::DESCRIPTION,
                length: PUBLIC_KEY_LENGTH,
            }));
        }

        let mut compressed = [0u8; PUBLIC_KEY_LENGTH];
        compressed.copy_from_slice(bytes);

        match EdwardsPoint::decompress(&compressed) {
            Some(point) => Ok(PublicKey { compressed, point }),
            None => Err(SignatureError::PointDecompressionError),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &PublicKey) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for PublicKey {}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.compressed
    }
}

serde_boilerplate!(PublicKey);
