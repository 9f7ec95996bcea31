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

//! ECDSA public keys: explicit points, or bare secp256k1 addresses.

use tracing::debug;

use crate::ecdsa::secp256k1::{self, ADDRESS_LENGTH, RECOVERABLE_SIGNATURE_LENGTH};
use crate::ecdsa::{pad_or_cut, AlgorithmOption, Curve};
use crate::errors::{EcdsaError, SignatureError};

/// A public key for one of the ECDSA algorithms.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EcdsaPublicKey {
    /// A full point, `0x04 || X || Y`.
    ///
    /// With `recover` set (secp256k1 only) the key encodes as its address
    /// and verifies by recovery.
    Explicit {
        /// Curve of the point
        curve: Curve,
        /// Uncompressed SEC1 encoding
        uncompressed: Vec<u8>,
        /// Recovery mode
        recover: bool,
    },
    /// A secp256k1 address. Verifies recoverable signatures only.
    Address([u8; ADDRESS_LENGTH]),
}

impl EcdsaPublicKey {
    /// Decode a public key for `option`.
    ///
    /// On secp256k1 (either option) 20 bytes are an address and 65 bytes an
    /// explicit point. A 65 byte key handed in as `Secp256k1Recover` is
    /// taken as a plain explicit key; 65 byte signatures still verify
    /// against it by recovery. Other curves take the uncompressed point only.
    ///
    /// # Example
    ///
    /// ```
    /// # use ecsign::ecdsa::{AlgorithmOption, EcdsaPublicKey};
    /// # fn doctest() -> Result<(), ecsign::SignatureError> {
    /// let address = [0x97u8; 20];
    /// let key = EcdsaPublicKey::from_bytes(&address, AlgorithmOption::Secp256k1Recover)?;
    /// assert!(key.is_recover());
    /// assert_eq!(key.to_bytes(), address.to_vec());
    /// # Ok(())
    /// # }
    /// # fn main() { doctest().unwrap(); }
    /// ```
    pub fn from_bytes(bytes: &[u8], option: AlgorithmOption) -> Result<EcdsaPublicKey, SignatureError> {
        let curve = option.curve();

        if curve == Curve::Secp256k1 {
            if bytes.len() == ADDRESS_LENGTH {
                let mut address = [0u8; ADDRESS_LENGTH];
                address.copy_from_slice(bytes);
                return Ok(EcdsaPublicKey::Address(address));
            }
            if bytes.len() != curve.uncompressed_len() {
                return Err(EcdsaError::KeyLength(bytes.len()).into());
            }
            if option == AlgorithmOption::Secp256k1Recover {
                debug!("65 byte secp256k1 key requested in recovery mode, decoding as explicit");
            }
        } else if bytes.len() != curve.uncompressed_len() {
            return Err(EcdsaError::PublicKeyLength {
                length: bytes.len(),
                expected: curve.uncompressed_len(),
            }
            .into());
        }

        if bytes[0] != 0x04 {
            return Err(EcdsaError::PointTag.into());
        }
        curve.check_point(bytes)?;

        Ok(EcdsaPublicKey::Explicit {
            curve,
            uncompressed: bytes.to_vec(),
            recover: false,
        })
    }

    /// The wire form: the address in recovery mode, the point otherwise.
    ///
    /// A recovery key built by hand around a malformed point has no address
    /// and encodes as that point.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            EcdsaPublicKey::Explicit {
                uncompressed,
                recover: true,
                ..
            } => match secp256k1::address(uncompressed) {
                Ok(address) => address.to_vec(),
                Err(_) => uncompressed.clone(),
            },
            EcdsaPublicKey::Explicit { uncompressed, .. } => uncompressed.clone(),
            EcdsaPublicKey::Address(address) => address.to_vec(),
        }
    }

    /// The curve of the key.
    pub fn curve(&self) -> Curve {
        match self {
            EcdsaPublicKey::Explicit { curve, .. } => *curve,
            EcdsaPublicKey::Address(_) => Curve::Secp256k1,
        }
    }

    /// Whether the key is in recovery mode.
    pub fn is_recover(&self) -> bool {
        match self {
            EcdsaPublicKey::Explicit { recover, .. } => *recover,
            EcdsaPublicKey::Address(_) => true,
        }
    }

    /// The algorithm the key belongs to.
    pub fn algorithm(&self) -> AlgorithmOption {
        if self.is_recover() {
            return AlgorithmOption::Secp256k1Recover;
        }
        match self.curve() {
            Curve::Secp256k1 => AlgorithmOption::Secp256k1,
            Curve::P256 => AlgorithmOption::Secp256r1,
            Curve::P384 => AlgorithmOption::Secp384r1,
            Curve::P521 => AlgorithmOption::Secp521r1,
        }
    }

    /// The uncompressed point, unless only an address is known.
    pub fn uncompressed(&self) -> Option<&[u8]> {
        match self {
            EcdsaPublicKey::Explicit { uncompressed, .. } => Some(uncompressed),
            EcdsaPublicKey::Address(_) => None,
        }
    }

    /// The secp256k1 address of the key.
    pub fn address(&self) -> Option<[u8; ADDRESS_LENGTH]> {
        match self {
            EcdsaPublicKey::Explicit {
                curve: Curve::Secp256k1,
                uncompressed,
                ..
            } => secp256k1::address(uncompressed).ok(),
            EcdsaPublicKey::Explicit { .. } => None,
            EcdsaPublicKey::Address(address) => Some(*address),
        }
    }

    /// Verify `signature` over an already hashed `digest`.
    ///
    /// `signature` is either ASN.1 DER or, on secp256k1, the 65 byte
    /// recoverable form. A 65 byte signature is checked by recovering the
    /// signer and comparing against the point or address; DER signatures
    /// need the point.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if the signature is valid, and `Err` otherwise.
    pub fn verify(&self, signature: &[u8], digest: &[u8]) -> Result<(), SignatureError> {
        let curve = self.curve();
        let recovery = curve == Curve::Secp256k1
            && (self.is_recover() || signature.len() == RECOVERABLE_SIGNATURE_LENGTH);
        let asn1 = curve.is_der(signature);
        let point = self.uncompressed();

        if !asn1 && signature.len() != RECOVERABLE_SIGNATURE_LENGTH {
            return Err(EcdsaError::SignatureFormat(hex_of(signature)).into());
        }
        if !recovery && point.is_none() {
            return Err(EcdsaError::EmptyKey.into());
        }

        match (recovery, asn1, point) {
            (true, true, None) => Err(EcdsaError::RecoveryKeyWithAsn1.into()),
            (_, true, Some(point)) => {
                let prehash = curve.normalize_digest(digest);
                curve.verify_der(point, &prehash, signature).map_err(SignatureError::from)
            }
            (true, false, _) => {
                debug!("verifying by public key recovery");
                self.verify_recovered(signature, digest)
            }
            _ => Err(EcdsaError::NotRecoveryMode.into()),
        }
    }

    fn verify_recovered(&self, signature: &[u8], digest: &[u8]) -> Result<(), SignatureError> {
        let mut padded = [0u8; 32];
        pad_or_cut(digest, &mut padded);
        let recovered =
            secp256k1::recover_pubkey(&padded, signature).map_err(|_| EcdsaError::InvalidSignature)?;

        let matches = match self {
            EcdsaPublicKey::Explicit { uncompressed, .. } => recovered[..] == uncompressed[..],
            EcdsaPublicKey::Address(address) => secp256k1::address(&recovered)? == *address,
        };
        if matches {
            Ok(())
        } else {
            Err(EcdsaError::InvalidSignature.into())
        }
    }
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
