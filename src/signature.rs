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

//! A Rust implementation of Ed25519 signing

use core::fmt::Debug;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::curve25519::{mul_base, vartime_double_scalar_mul_basepoint, Scalar};
use crate::errors::{InternalError, SignatureError};
use crate::hash::sha512;
use crate::keys::{PrivateKey, PublicKey};

/// The length of an Ed25519 `Signature`, in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 signature.
///
/// # Note
///
/// These signatures are detached: they do **not** include a copy
/// of the message which has been signed.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Signature {
    /// `R = r * B`, the commitment to the nonce `r`, which is derived from
    /// the secret nonce prefix and the message.
    pub(crate) R: [u8; 32],

    /// `s = r + k * a mod L`, where `k = H(R || A || M)` and `a` is the
    /// clamped secret scalar. Kept as received so verification can refuse
    /// encodings that are not reduced.
    pub(crate) s: [u8; 32],
}

impl Debug for Signature {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "Signature( R: {:?}, s: {:?} )", &self.R, &self.s)
    }
}

impl Signature {
    pub(crate) const DESCRIPTION: &'static str = "An Ed25519 signature as 64 bytes, R then s.";

    /// Convert this signature to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.R);
        out[32..].copy_from_slice(&self.s);
        out
    }

    /// Construct a `Signature` from a slice of bytes.
    ///
    /// Only the length is checked here; `s` is checked when verifying.
    #[inline]
    #[allow(non_snake_case)]
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::from(InternalError::BytesLengthError {
                name: "Signature",
                description: Signature::DESCRIPTION,
                length: SIGNATURE_LENGTH,
            }));
        }
        let mut R = [0u8; 32];
        let mut s = [0u8; 32];
        R.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(Signature { R, s })
    }
}

serde_boilerplate!(Signature);

/// `H(R || A || M) mod L`
#[allow(non_snake_case)]
pub(crate) fn challenge(R: &[u8], A: &[u8], message: &[u8]) -> Scalar {
    let mut h = sha512(&[R, A, message]);
    let k = Scalar::from_bytes_mod_order_wide(&h);
    h.zeroize();
    k
}

impl PrivateKey {
    /// Sign a message with this key.
    ///
    /// The nonce is derived from the secret prefix and the message, so the
    /// same message always produces the same signature.
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
    /// let (private_key, public_key) = generate_key(&mut OsRng);
    /// let message: &[u8] = b"All I want is to pet all of the dogs.";
    ///
    /// let sig: Signature = private_key.sign(message);
    /// assert!(public_key.verify(message, &sig).is_ok());
    /// ```
    #[allow(non_snake_case)]
    pub fn sign(&self, message: &[u8]) -> Signature {
        let expanded = self.expand();

        let mut nonce_hash = sha512(&[&expanded.nonce[..], message]);
        let mut r = Scalar::from_bytes_mod_order_wide(&nonce_hash);
        nonce_hash.zeroize();

        let R = mul_base(&r).compress();
        let k = challenge(&R, self.public.as_bytes(), message);
        let s = Scalar::mul_add(&k, &expanded.key, &r);
        r.zeroize();

        Signature { R, s: s.to_bytes() }
    }
}

impl PublicKey {
    /// Verify a signature on a message with this public key.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if the signature is valid, and `Err` otherwise.
    #[allow(non_snake_case)]
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let s = match Scalar::from_canonical_bytes(signature.s) {
            Some(s) => s,
            None => return Err(SignatureError::ScalarFormatError),
        };

        let k = challenge(&signature.R, self.as_bytes(), message);
        let minus_A = -self.as_point();
        // R' = s * B - k * A
        let R = vartime_double_scalar_mul_basepoint(&k, &minus_A, &s);

        if R.compress().ct_eq(&signature.R).into() {
            Ok(())
        } else {
            Err(SignatureError::VerifyError)
        }
    }
}
