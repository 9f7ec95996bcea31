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

//! ECDSA private keys

use core::fmt::Debug;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::ecdsa::public::EcdsaPublicKey;
use crate::ecdsa::{left_pad, pad_or_cut, secp256k1, AlgorithmOption, Curve};
use crate::errors::{EcdsaError, SignatureError};
use crate::pool::ScratchPool;

/// A private scalar `D` together with its public key.
///
/// The scalar is kept big-endian at the curve's field length and wiped on
/// drop.
#[derive(Clone)]
pub struct EcdsaPrivateKey {
    option: AlgorithmOption,
    d: Zeroizing<Vec<u8>>,
    public: EcdsaPublicKey,
}

impl Debug for EcdsaPrivateKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "EcdsaPrivateKey {{ option: {}, public: {:?} }}", self.option, self.public)
    }
}

impl EcdsaPrivateKey {
    /// Generate a key for `option`.
    ///
    /// Draws `bitsize / 8 + 8` bytes so that reducing into `[1, N - 1]`
    /// leaves no noticeable bias.
    pub fn generate<R>(option: AlgorithmOption, pool: &ScratchPool, csprng: &mut R) -> Result<EcdsaPrivateKey, SignatureError>
    where
        R: RngCore + CryptoRng,
    {
        let curve = option.curve();
        let mut raw = Zeroizing::new(vec![0u8; curve.bit_size() / 8 + 8]);
        csprng.fill_bytes(&mut raw);

        let d = {
            let mut draw = pool.big();
            let mut n_minus_one = pool.big();
            let mut d = pool.big();
            load_be(&mut draw, &raw);
            n_minus_one.clone_from(curve.order());
            *n_minus_one -= 1u32;

            // the draw and the scalar live in pooled storage, wiped on return
            *d = &*draw % &*n_minus_one;
            *d += 1u32;
            Zeroizing::new(left_pad(&Zeroizing::new(d.to_bytes_be()), curve.field_len()))
        };

        EcdsaPrivateKey::with_scalar(option, d)
    }

    /// Decode a big-endian scalar, left padding short input.
    ///
    /// Fails if the scalar is zero, at least `N`, or longer than the field.
    pub fn from_bytes(bytes: &[u8], option: AlgorithmOption) -> Result<EcdsaPrivateKey, SignatureError> {
        let field_len = option.curve().field_len();
        if bytes.len() > field_len {
            return Err(EcdsaError::InvalidPrivateKey.into());
        }
        EcdsaPrivateKey::with_scalar(option, Zeroizing::new(left_pad(bytes, field_len)))
    }

    fn with_scalar(option: AlgorithmOption, d: Zeroizing<Vec<u8>>) -> Result<EcdsaPrivateKey, SignatureError> {
        let public = derive_public(option, &d)?;
        Ok(EcdsaPrivateKey { option, d, public })
    }

    /// The scalar, big-endian at the field length.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.d.clone()
    }

    /// The algorithm the key signs with.
    pub fn algorithm(&self) -> AlgorithmOption {
        self.option
    }

    /// The curve of the key.
    pub fn curve(&self) -> Curve {
        self.option.curve()
    }

    /// The public half.
    pub fn public_key(&self) -> &EcdsaPublicKey {
        &self.public
    }

    /// Replace the public half with a known key instead of recomputing it.
    ///
    /// Address-only keys carry no point and are refused, as are keys on
    /// another curve. The point is not checked against `D`.
    pub fn set_public_key(&mut self, public: &EcdsaPublicKey) -> Result<(), SignatureError> {
        if let EcdsaPublicKey::Address(_) = public {
            return Err(EcdsaError::AddressOnlyKey.into());
        }
        if public.curve() != self.curve() {
            return Err(EcdsaError::CurveMismatch {
                expected: self.curve().name(),
                found: public.curve().name(),
            }
            .into());
        }
        self.public = public.clone();
        Ok(())
    }

    /// Recompute the public half from `D`.
    pub fn calculate_public_key(&mut self) -> Result<&EcdsaPublicKey, SignatureError> {
        self.public = derive_public(self.option, &self.d)?;
        Ok(&self.public)
    }

    /// Sign an already hashed `digest`.
    ///
    /// secp256k1 keys produce the 65 byte `r || s || v` form over the digest
    /// cut or left padded to 32 bytes. The NIST curves produce ASN.1 DER.
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut scratch = Zeroizing::new([0u8; 32]);
        self.sign_padded(digest, &mut scratch)
    }

    /// Like [`sign`](EcdsaPrivateKey::sign), padding the secp256k1 digest in a
    /// buffer taken from `pool`.
    pub fn sign_with(&self, pool: &ScratchPool, digest: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut scratch = pool.bytes32();
        self.sign_padded(digest, &mut scratch)
    }

    fn sign_padded(&self, digest: &[u8], scratch: &mut [u8; 32]) -> Result<Vec<u8>, SignatureError> {
        let curve = self.curve();
        if curve == Curve::Secp256k1 {
            pad_or_cut(digest, scratch);
            let signature = secp256k1::sign_recoverable(&scratch[..], &self.d)?;
            return Ok(signature.to_vec());
        }
        let prehash = curve.normalize_digest(digest);
        Ok(curve.sign_der(&self.d, &prehash)?)
    }
}

/// Load big-endian `bytes` into `big` through its existing digit storage.
fn load_be(big: &mut BigUint, bytes: &[u8]) {
    let mut digits = Zeroizing::new(Vec::with_capacity((bytes.len() + 3) / 4));
    for chunk in bytes.rchunks(4) {
        let mut word = [0u8; 4];
        word[4 - chunk.len()..].copy_from_slice(chunk);
        digits.push(u32::from_be_bytes(word));
        word.zeroize();
    }
    big.assign_from_slice(&digits);
}

fn derive_public(option: AlgorithmOption, d: &[u8]) -> Result<EcdsaPublicKey, SignatureError> {
    let curve = option.curve();
    let uncompressed = curve.public_key(d)?;
    Ok(EcdsaPublicKey::Explicit {
        curve,
        uncompressed,
        recover: option == AlgorithmOption::Secp256k1Recover,
    })
}
