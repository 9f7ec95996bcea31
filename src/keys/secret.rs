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

//! Ed25519 Private Key & Expanded Secret

use core::fmt::Debug;

use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, Zeroizing};

use crate::curve25519::{mul_base, Scalar};
use crate::errors::{InternalError, SignatureError};
use crate::hash::sha512;
use crate::keys::{PublicKey, PUBLIC_KEY_LENGTH};

/// The length of an Ed25519 `PrivateKey`, in bytes: seed then public key.
pub const PRIVATE_KEY_LENGTH: usize = 64;

/// The length of the seed a `PrivateKey` is derived from.
pub const SEED_LENGTH: usize = 32;

/// An Ed25519 private key, `seed || public key`.
#[derive(Clone)]
pub struct PrivateKey {
    pub(crate) seed: [u8; SEED_LENGTH],
    pub(crate) public: PublicKey,
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "PrivateKey {{ public: {:?} }}", &self.public)
    }
}

impl Eq for PrivateKey {}
impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).unwrap_u8() == 1u8
    }
}
impl ConstantTimeEq for PrivateKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.seed.ct_eq(&other.seed) & self.public.as_bytes().ct_eq(other.public.as_bytes())
    }
}

/// Overwrite secret key material with null bytes when it goes out of scope.
impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl PrivateKey {
    pub(crate) const DESCRIPTION: &'static str = "An Ed25519 private key as 64 bytes.";

    /// Derive the key pair for a 32 byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> PrivateKey {
        let expanded = ExpandedSecret::from_seed(seed);
        let public = PublicKey::from_point(mul_base(&expanded.key));
        PrivateKey {
            seed: *seed,
            public,
        }
    }

    /// Convert this private key to its 64 byte layout.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        let mut out = [0u8; PRIVATE_KEY_LENGTH];
        out[..SEED_LENGTH].copy_from_slice(&self.seed);
        out[SEED_LENGTH..].copy_from_slice(self.public.as_bytes());
        out
    }

    /// View the seed half of this key.
    #[inline]
    pub fn seed(&self) -> &[u8; SEED_LENGTH] {
        &self.seed
    }

    /// The public half of the 64 byte layout.
    #[inline]
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Construct a `PrivateKey` from its 64 byte layout.
    ///
    /// The second half is taken as the public key as is; it must decode
    /// but is not re-derived from the seed.
    ///
    /// # Example
    ///
    /// ```
    /// # extern crate ecsign;
    /// #
    /// use ecsign::*;
    ///
    /// # fn doctest() -> Result<PrivateKey, SignatureError> {
    /// let seed: [u8; SEED_LENGTH] = [
    ///    157, 097, 177, 157, 239, 253, 090, 096,
    ///    186, 132, 074, 244, 146, 236, 044, 196,
    ///    068, 073, 197, 105, 123, 050, 105, 025,
    ///    112, 059, 172, 003, 028, 174, 127, 096, ];
    ///
    /// let bytes = PrivateKey::from_seed(&seed).to_bytes();
    /// let private_key: PrivateKey = PrivateKey::from_bytes(&bytes)?;
    /// #
    /// # Ok(private_key)
    /// # }
    /// #
    /// # fn main() {
    /// #     let result = doctest();
    /// #     assert!(result.is_ok());
    /// # }
    /// ```
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `PrivateKey` or whose error value
    /// is a `SignatureError` wrapping the internal error that occurred.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<PrivateKey, SignatureError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(SignatureError::from(InternalError::BytesLengthError {
                name: "PrivateKey",
                description: PrivateKey::DESCRIPTION,
                length: PRIVATE_KEY_LENGTH,
            }));
        }

        let public = PublicKey::from_bytes(&bytes[SEED_LENGTH..])?;
        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&bytes[..SEED_LENGTH]);

        Ok(PrivateKey { seed, public })
    }

    /// Generate a fresh `PrivateKey` from a `csprng`.
    ///
    /// # Example
    ///
    /// ```
    /// # extern crate rand;
    /// # extern crate ecsign;
    /// #
    /// use rand::rngs::OsRng;
    /// use ecsign::*;
    ///
    /// let private_key: PrivateKey = PrivateKey::generate(&mut OsRng);
    /// let public_key: PublicKey = private_key.public_key();
    /// ```
    pub fn generate<T>(csprng: &mut T) -> PrivateKey
    where
        T: CryptoRng + RngCore,
    {
        let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
        csprng.fill_bytes(&mut seed[..]);
        PrivateKey::from_seed(&seed)
    }

    /// Hash the seed into the signing scalar and the nonce prefix.
    pub(crate) fn expand(&self) -> ExpandedSecret {
        ExpandedSecret::from_seed(&self.seed)
    }
}

serde_boilerplate!(PrivateKey);

/// The SHA-512 expansion of a seed: the clamped scalar `a` and the
/// 32 byte prefix that keys nonce derivation.
pub(crate) struct ExpandedSecret {
    /// `a`, clamped but not reduced
    pub(crate) key: Scalar,
    pub(crate) nonce: [u8; 32],
}

impl ExpandedSecret {
    pub(crate) fn from_seed(seed: &[u8; SEED_LENGTH]) -> ExpandedSecret {
        let mut h = sha512(&[&seed[..]]);

        let mut lower = [0u8; 32];
        let mut nonce = [0u8; 32];
        lower.copy_from_slice(&h[..32]);
        nonce.copy_from_slice(&h[32..]);

        lower[0] &= 248;
        lower[31] &= 63;
        lower[31] |= 64;

        let key = Scalar::from_bits(&lower);
        lower.zeroize();
        h.zeroize();

        ExpandedSecret { key, nonce }
    }
}

impl Drop for ExpandedSecret {
    fn drop(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }
}
