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

//! Messages exchanged during a cosigning round

use core::fmt::Debug;

use crate::curve25519::{EdwardsPoint, Scalar};
use crate::errors::{InternalError, SignatureError};

/// The length of a well formed `Commitment`, in bytes.
pub const COMMITMENT_LENGTH: usize = 32;

/// The length of a `SignaturePart`, in bytes.
pub const SIGNATURE_PART_LENGTH: usize = 32;

/// An encoded point as it arrives from a cosigner.
///
/// Commitments travel over untrusted links, so one may be missing (empty)
/// or malformed; the leader decides what to do with it. The challenge it
/// answers with is also a `Commitment`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Commitment(pub(crate) Vec<u8>);

impl Debug for Commitment {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "Commitment({:?})", &self.0)
    }
}

impl Commitment {
    /// Wrap whatever bytes were received.
    pub fn from_bytes(bytes: &[u8]) -> Commitment {
        Commitment(bytes.to_vec())
    }

    /// A slot for a cosigner that never sent a commitment.
    pub fn missing() -> Commitment {
        Commitment(Vec::new())
    }

    /// The received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the commitment has the length of an encoded point.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == COMMITMENT_LENGTH
    }

    pub(crate) fn from_point(point: &EdwardsPoint) -> Commitment {
        Commitment(point.compress().to_vec())
    }

    /// The commitment as a fixed size array, if it has the right length.
    pub(crate) fn to_array(&self) -> Option<[u8; COMMITMENT_LENGTH]> {
        if !self.is_well_formed() {
            return None;
        }
        let mut out = [0u8; COMMITMENT_LENGTH];
        out.copy_from_slice(&self.0);
        Some(out)
    }

    pub(crate) fn decompress(&self) -> Option<EdwardsPoint> {
        self.to_array().and_then(|bytes| EdwardsPoint::decompress(&bytes))
    }
}

impl From<Vec<u8>> for Commitment {
    fn from(bytes: Vec<u8>) -> Commitment {
        Commitment(bytes)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One cosigner's response, `s_i = h * a_i + v_i mod L`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct SignaturePart(pub(crate) Scalar);

impl Debug for SignaturePart {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "SignaturePart({:?})", &self.0.to_bytes())
    }
}

impl SignaturePart {
    pub(crate) const DESCRIPTION: &'static str = "A cosigner's partial signature as a 32 byte scalar.";

    /// Little-endian encoding of the scalar.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_PART_LENGTH] {
        self.0.to_bytes()
    }

    /// Construct a `SignaturePart` from a canonical 32 byte scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<SignaturePart, SignatureError> {
        if bytes.len() != SIGNATURE_PART_LENGTH {
            return Err(SignatureError::from(InternalError::BytesLengthError {
                name: "SignaturePart",
                description: SignaturePart::DESCRIPTION,
                length: SIGNATURE_PART_LENGTH,
            }));
        }
        let mut bits = [0u8; SIGNATURE_PART_LENGTH];
        bits.copy_from_slice(bytes);

        Scalar::from_canonical_bytes(bits)
            .map(SignaturePart)
            .ok_or(SignatureError::ScalarFormatError)
    }
}

serde_boilerplate!(SignaturePart);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_commitments_are_not_well_formed() {
        assert!(!Commitment::missing().is_well_formed());
        assert!(Commitment::missing().decompress().is_none());
        assert!(!Commitment::from_bytes(&[0u8; 33]).is_well_formed());
    }

    #[test]
    fn commitment_decodes_points() {
        let c = Commitment::from_point(&crate::curve25519::ED25519_BASEPOINT);
        assert!(c.is_well_formed());
        assert_eq!(c.decompress(), Some(crate::curve25519::ED25519_BASEPOINT));
    }

    #[test]
    fn signature_part_must_be_reduced() {
        assert_eq!(
            SignaturePart::from_bytes(&[0xffu8; 32]),
            Err(SignatureError::ScalarFormatError)
        );
        assert!(SignaturePart::from_bytes(&[0u8; 31]).is_err());
        let part = SignaturePart::from_bytes(&[1u8; 32]).unwrap();
        assert_eq!(part.to_bytes(), [1u8; 32]);
    }
}
