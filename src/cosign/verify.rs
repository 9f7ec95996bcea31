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

//! Checking partial and aggregate cosignatures.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::cosign::AGGREGATE_PUBLIC_KEY_LENGTH;
use crate::curve25519::{vartime_double_scalar_mul_basepoint, EdwardsPoint, Scalar};
use crate::errors::{CosignError, InternalError, SignatureError};
use crate::hash::sha512;

/// Bytes before the mask in an aggregate signature: challenge, S and aggNonceCommit.
pub const AGGREGATE_SIGNATURE_HEADER_LENGTH: usize = 96;

/// `h = H(c || aggAllX || M) mod L`.
///
/// The context is always the aggregate over the full participant list,
/// so it does not move when cosigners drop out.
pub(crate) fn cosign_challenge(challenge: &[u8], agg_all_x: &[u8], message: &[u8]) -> Scalar {
    let mut digest = sha512(&[challenge, agg_all_x, message]);
    let h = Scalar::from_bytes_mod_order_wide(&digest);
    digest.zeroize();
    h
}

/// Whether `s * B - h * X` encodes to `expected_r`.
#[allow(non_snake_case)]
pub(crate) fn verify_relation(
    message: &[u8],
    challenge: &[u8],
    expected_r: &[u8; 32],
    s: &Scalar,
    X: &EdwardsPoint,
    agg_all_x: &[u8],
) -> bool {
    let h = cosign_challenge(challenge, agg_all_x, message);
    let minus_X = -X;
    let R = vartime_double_scalar_mul_basepoint(&h, &minus_X, s);
    R.compress().ct_eq(expected_r).into()
}

/// Number of cosigners whose bit in `mask` is clear.
pub fn count_enabled(mask: &[u8]) -> usize {
    mask.iter().map(|byte| byte.count_zeros() as usize).sum()
}

fn decode_point(bytes: &[u8]) -> Result<EdwardsPoint, SignatureError> {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[..32]);
    EdwardsPoint::decompress(&buf).ok_or(SignatureError::PointDecompressionError)
}

/// Verify an aggregate cosignature.
///
/// `signature` is `challenge || S || aggNonceCommit || mask` and
/// `agg_public_key` is `aggX || aggAllX` as published by the leader after
/// the round. At least `threshold` bits of the mask must be clear.
///
/// # Return
///
/// Returns `Ok(())` if the signature is valid, and `Err` otherwise.
#[allow(non_snake_case)]
pub fn agg_verify(
    threshold: usize,
    message: &[u8],
    signature: &[u8],
    agg_public_key: &[u8],
) -> Result<(), SignatureError> {
    if signature.len() < AGGREGATE_SIGNATURE_HEADER_LENGTH {
        return Err(CosignError::SignatureTooShort {
            length: signature.len(),
        }
        .into());
    }
    if agg_public_key.len() != AGGREGATE_PUBLIC_KEY_LENGTH {
        return Err(InternalError::BytesLengthError {
            name: "AggregatePublicKey",
            description: "aggX followed by aggAllX, 64 bytes.",
            length: AGGREGATE_PUBLIC_KEY_LENGTH,
        }
        .into());
    }

    let enabled = count_enabled(&signature[AGGREGATE_SIGNATURE_HEADER_LENGTH..]);
    if enabled < threshold {
        return Err(CosignError::ThresholdNotMet { enabled, threshold }.into());
    }

    let agg_X = decode_point(&agg_public_key[..32])?;

    // R' = R - aggNonceCommit takes out the commitments of cosigners
    // that were dropped after the challenge.
    let R = decode_point(&signature[..32])?;
    let nonce_commit = decode_point(&signature[64..96])?;
    let R_prime = (&R - &nonce_commit).compress();

    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature[32..64]);
    let s = Scalar::from_canonical_bytes(s_bytes).ok_or(SignatureError::ScalarFormatError)?;

    if verify_relation(
        message,
        &signature[..32],
        &R_prime,
        &s,
        &agg_X,
        &agg_public_key[32..],
    ) {
        Ok(())
    } else {
        Err(SignatureError::VerifyError)
    }
}
