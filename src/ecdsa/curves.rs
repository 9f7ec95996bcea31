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

//! The curves behind the ECDSA keys, and the per-curve glue into the
//! RustCrypto signers.

use core::fmt;

use num_bigint::BigUint;

use crate::errors::EcdsaError;

/// A named curve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Curve {
    /// secp256k1, the one curve with public key recovery
    Secp256k1,
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// NIST P-521 (secp521r1)
    P521,
}

// One module of glue per curve. Every function takes and returns SEC1 /
// big-endian bytes so the key types above stay curve agnostic.
macro_rules! curve_glue {
    ($module:ident, $krate:ident, $curve:ty) => {
        pub(crate) mod $module {
            use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use num_bigint::BigUint;
            use once_cell::sync::Lazy;

            use $krate::ecdsa::{SigningKey, VerifyingKey};
            use $krate::elliptic_curve::bigint::Encoding;
            use $krate::elliptic_curve::sec1::ToEncodedPoint;
            use $krate::elliptic_curve::Curve;
            use $krate::{PublicKey, SecretKey};

            use crate::errors::EcdsaError;

            type Signature = ecdsa::Signature<$curve>;

            pub(crate) static ORDER: Lazy<BigUint> =
                Lazy::new(|| BigUint::from_bytes_be(&<$curve as Curve>::ORDER.to_be_bytes()));

            pub(crate) fn public_key(secret: &[u8]) -> Result<Vec<u8>, EcdsaError> {
                let secret = SecretKey::from_slice(secret).map_err(|_| EcdsaError::InvalidPrivateKey)?;
                Ok(secret.public_key().to_encoded_point(false).as_bytes().to_vec())
            }

            pub(crate) fn check_point(point: &[u8]) -> Result<(), EcdsaError> {
                PublicKey::from_sec1_bytes(point)
                    .map(|_| ())
                    .map_err(|_| EcdsaError::InvalidPublicKey)
            }

            pub(crate) fn sign(secret: &[u8], prehash: &[u8]) -> Result<Vec<u8>, EcdsaError> {
                let key = SigningKey::from_slice(secret).map_err(|_| EcdsaError::InvalidPrivateKey)?;
                let signature: Signature = key.sign_prehash(prehash).map_err(|_| EcdsaError::Signing)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }

            pub(crate) fn is_der(signature: &[u8]) -> bool {
                Signature::from_der(signature).is_ok()
            }

            pub(crate) fn verify(point: &[u8], prehash: &[u8], der: &[u8]) -> Result<(), EcdsaError> {
                let key = VerifyingKey::from_sec1_bytes(point).map_err(|_| EcdsaError::InvalidPublicKey)?;
                let signature = Signature::from_der(der).map_err(|_| EcdsaError::InvalidSignature)?;
                // s and n - s verify alike; secp256k1 only takes the low one
                let signature = signature.normalize_s().unwrap_or(signature);
                key.verify_prehash(prehash, &signature)
                    .map_err(|_| EcdsaError::InvalidSignature)
            }
        }
    };
}

curve_glue!(secp256k1_glue, k256, k256::Secp256k1);
curve_glue!(p256_glue, p256, p256::NistP256);
curve_glue!(p384_glue, p384, p384::NistP384);
curve_glue!(p521_glue, p521, p521::NistP521);

macro_rules! dispatch {
    ($curve:expr, $function:ident ( $($arg:expr),* )) => {
        match $curve {
            Curve::Secp256k1 => secp256k1_glue::$function($($arg),*),
            Curve::P256 => p256_glue::$function($($arg),*),
            Curve::P384 => p384_glue::$function($($arg),*),
            Curve::P521 => p521_glue::$function($($arg),*),
        }
    };
}

impl Curve {
    /// Size of the group order in bits.
    pub fn bit_size(self) -> usize {
        match self {
            Curve::Secp256k1 | Curve::P256 => 256,
            Curve::P384 => 384,
            Curve::P521 => 521,
        }
    }

    /// Bytes per coordinate and per private scalar.
    pub fn field_len(self) -> usize {
        (self.bit_size() + 7) >> 3
    }

    /// Length of `0x04 || X || Y`.
    pub fn uncompressed_len(self) -> usize {
        1 + 2 * self.field_len()
    }

    /// Conventional name of the curve.
    pub fn name(self) -> &'static str {
        match self {
            Curve::Secp256k1 => "secp256k1",
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
        }
    }

    /// The group order `N`.
    pub fn order(self) -> &'static BigUint {
        match self {
            Curve::Secp256k1 => &secp256k1_glue::ORDER,
            Curve::P256 => &p256_glue::ORDER,
            Curve::P384 => &p384_glue::ORDER,
            Curve::P521 => &p521_glue::ORDER,
        }
    }

    /// Uncompressed public point of a big-endian, field length scalar.
    pub(crate) fn public_key(self, secret: &[u8]) -> Result<Vec<u8>, EcdsaError> {
        dispatch!(self, public_key(secret))
    }

    pub(crate) fn check_point(self, point: &[u8]) -> Result<(), EcdsaError> {
        dispatch!(self, check_point(point))
    }

    /// DER signature over an already normalized digest.
    pub(crate) fn sign_der(self, secret: &[u8], prehash: &[u8]) -> Result<Vec<u8>, EcdsaError> {
        dispatch!(self, sign(secret, prehash))
    }

    pub(crate) fn is_der(self, signature: &[u8]) -> bool {
        dispatch!(self, is_der(signature))
    }

    pub(crate) fn verify_der(self, point: &[u8], prehash: &[u8], signature: &[u8]) -> Result<(), EcdsaError> {
        dispatch!(self, verify(point, prehash, signature))
    }

    /// Map a digest of any length onto a field length integer.
    ///
    /// Keeps the leftmost `field_len` bytes and shifts out the bits past
    /// the order's size, so a 64 byte digest on P-521 and a 20 byte digest
    /// on P-256 both land where the classic hash-to-integer rule puts them.
    pub(crate) fn normalize_digest(self, digest: &[u8]) -> Vec<u8> {
        let field_len = self.field_len();
        let kept = &digest[..digest.len().min(field_len)];

        let mut value = BigUint::from_bytes_be(kept);
        let bits = kept.len() * 8;
        if bits > self.bit_size() {
            value >>= bits - self.bit_size();
        }
        super::left_pad(&value.to_bytes_be(), field_len)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
