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

//! secp256k1 with recoverable signatures.
//!
//! Scalars are 32 byte big-endian, points are 65 byte uncompressed SEC1,
//! and recoverable signatures are `r || s || v` with `v` in `0..=3`.

use core::convert::TryFrom;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{AffinePoint, NonZeroScalar, PublicKey};

use crate::errors::EcdsaError;
use crate::hash::keccak256;

/// Length of `0x04 || X || Y`.
pub const UNCOMPRESSED_LENGTH: usize = 65;

/// Length of `r || s || v`.
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

/// Length of an address, the tail of the Keccak-256 of the point.
pub const ADDRESS_LENGTH: usize = 20;

fn encode(point: &PublicKey) -> [u8; UNCOMPRESSED_LENGTH] {
    let mut out = [0u8; UNCOMPRESSED_LENGTH];
    out.copy_from_slice(point.to_encoded_point(false).as_bytes());
    out
}

/// `k * G`.
pub fn scalar_base_mult(k: &[u8]) -> Result<[u8; UNCOMPRESSED_LENGTH], EcdsaError> {
    let k = NonZeroScalar::try_from(k).map_err(|_| EcdsaError::InvalidPrivateKey)?;
    Ok(encode(&PublicKey::from_secret_scalar(&k)))
}

/// `k * P` for an uncompressed point `P`.
pub fn ec_mult(point: &[u8], k: &[u8]) -> Result<[u8; UNCOMPRESSED_LENGTH], EcdsaError> {
    let point = PublicKey::from_sec1_bytes(point).map_err(|_| EcdsaError::InvalidPublicKey)?;
    let k = NonZeroScalar::try_from(k).map_err(|_| EcdsaError::InvalidPrivateKey)?;
    let product = AffinePoint::from(point.to_projective() * *k);
    let product = PublicKey::from_affine(product).map_err(|_| EcdsaError::InvalidPublicKey)?;
    Ok(encode(&product))
}

/// Sign a 32 byte digest, returning `r || s || v` with low `s`.
pub fn sign_recoverable(digest: &[u8], secret: &[u8]) -> Result<[u8; RECOVERABLE_SIGNATURE_LENGTH], EcdsaError> {
    if digest.len() != 32 {
        return Err(EcdsaError::SignatureFormat(format!("digest is {} bytes, 32 expected", digest.len())));
    }
    let key = SigningKey::from_slice(secret).map_err(|_| EcdsaError::InvalidPrivateKey)?;
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| EcdsaError::Signing)?;

    let mut out = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(out)
}

/// The public key that produced `signature` over a 32 byte digest.
///
/// Signatures with a high `s` are accepted: `(r, n - s)` recovers the same
/// key once the parity bit of `v` is flipped.
pub fn recover_pubkey(digest: &[u8], signature: &[u8]) -> Result<[u8; UNCOMPRESSED_LENGTH], EcdsaError> {
    if digest.len() != 32 {
        return Err(EcdsaError::Recovery);
    }
    if signature.len() != RECOVERABLE_SIGNATURE_LENGTH {
        return Err(EcdsaError::SignatureFormat(format!(
            "recoverable signature is {} bytes",
            signature.len()
        )));
    }

    let mut recovery_id = RecoveryId::from_byte(signature[64]).ok_or(EcdsaError::Recovery)?;
    let mut compact = Signature::from_slice(&signature[..64]).map_err(|_| EcdsaError::Recovery)?;
    if let Some(low) = compact.normalize_s() {
        compact = low;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let key = VerifyingKey::recover_from_prehash(digest, &compact, recovery_id).map_err(|_| EcdsaError::Recovery)?;
    let mut out = [0u8; UNCOMPRESSED_LENGTH];
    out.copy_from_slice(key.to_encoded_point(false).as_bytes());
    Ok(out)
}

/// Keccak-256 of the point without its `0x04` tag, last 20 bytes.
///
/// The point must be in the 65 byte uncompressed form; it is not checked to
/// be on the curve.
pub fn address(uncompressed: &[u8]) -> Result<[u8; ADDRESS_LENGTH], EcdsaError> {
    if uncompressed.len() != UNCOMPRESSED_LENGTH {
        return Err(EcdsaError::PublicKeyLength {
            length: uncompressed.len(),
            expected: UNCOMPRESSED_LENGTH,
        });
    }
    if uncompressed[0] != 0x04 {
        return Err(EcdsaError::PointTag);
    }
    let digest = keccak256(&[&uncompressed[1..]]);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaChaRng;

    const SECRET: &str = "3e83c9cd9a39bf96d1f77a978e1fb32be0ad1732eee157011e162e9749b2e90a";
    const PUBLIC: &str = "0454f73fc55299a40b20638f10c2d704dcb605e7e61b56ea11b4ad9528e533ab8501089fc3a87512ad4f6a6631086ab2734c56811268a1b7816d684d709c6becb8";

    #[test]
    fn base_mult_matches_known_key() {
        let secret = hex::decode(SECRET).unwrap();
        let public = scalar_base_mult(&secret).unwrap();
        assert_eq!(hex::encode(&public[..]), PUBLIC);
        assert_eq!(hex::encode(address(&public).unwrap()), "ec24bd2c319463b5fa10cb829ebc95de6520c2fe");
    }

    #[test]
    fn second_known_address() {
        let secret = hex::decode("289c2857d4598e37fb9647507e47a309d6133539bf21a8b9cb6df88fd5232032").unwrap();
        let public = scalar_base_mult(&secret).unwrap();
        assert_eq!(hex::encode(address(&public).unwrap()), "970e8128ab834e8eac17ab8e3812f010678cf791");
    }

    #[test]
    fn shared_point_commutes() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        csprng.fill_bytes(&mut a);
        csprng.fill_bytes(&mut b);

        let a_pub = scalar_base_mult(&a).unwrap();
        let b_pub = scalar_base_mult(&b).unwrap();
        assert_eq!(ec_mult(&b_pub, &a).unwrap()[..], ec_mult(&a_pub, &b).unwrap()[..]);
    }

    #[test]
    fn recovers_signer() {
        let secret = hex::decode(SECRET).unwrap();
        let digest = hex::decode("c336dd3813da656a8ff31136a163809eaaf762cc5445b8de8299489301486009").unwrap();

        let signature = sign_recoverable(&digest, &secret).unwrap();
        assert!(signature[64] <= 3);
        let recovered = recover_pubkey(&digest, &signature).unwrap();
        assert_eq!(hex::encode(&recovered[..]), PUBLIC);

        let mut other = digest.clone();
        other[0] ^= 1;
        match recover_pubkey(&other, &signature) {
            Ok(key) => assert_ne!(hex::encode(&key[..]), PUBLIC),
            Err(e) => assert_eq!(e, EcdsaError::Recovery),
        }
    }

    #[test]
    fn high_s_still_recovers() {
        let secret = hex::decode(SECRET).unwrap();
        let digest = [7u8; 32];
        let signature = sign_recoverable(&digest, &secret).unwrap();

        // replace s with n - s and flip the parity bit
        let compact = Signature::from_slice(&signature[..64]).unwrap();
        let (r, s) = compact.split_scalars();
        let high = Signature::from_scalars(r, -*s).unwrap();
        let mut flipped = [0u8; 65];
        flipped[..64].copy_from_slice(&high.to_bytes());
        flipped[64] = signature[64] ^ 1;

        assert_eq!(
            hex::encode(&recover_pubkey(&digest, &flipped).unwrap()[..]),
            PUBLIC
        );
    }

    #[test]
    fn malformed_inputs() {
        assert_eq!(recover_pubkey(&[0u8; 31], &[0u8; 65]), Err(EcdsaError::Recovery));
        assert!(recover_pubkey(&[0u8; 32], &[0u8; 64]).is_err());
        assert_eq!(recover_pubkey(&[0u8; 32], &[0u8; 65]), Err(EcdsaError::Recovery));
        assert_eq!(scalar_base_mult(&[0u8; 32]), Err(EcdsaError::InvalidPrivateKey));
        assert!(sign_recoverable(&[0u8; 20], &[1u8; 32]).is_err());
    }

    #[test]
    fn address_needs_an_uncompressed_point() {
        assert_eq!(
            address(&[]),
            Err(EcdsaError::PublicKeyLength {
                length: 0,
                expected: UNCOMPRESSED_LENGTH
            })
        );
        assert_eq!(
            address(&[0x04u8; 64]),
            Err(EcdsaError::PublicKeyLength {
                length: 64,
                expected: UNCOMPRESSED_LENGTH
            })
        );

        let mut compressed_tag = hex::decode(PUBLIC).unwrap();
        compressed_tag[0] = 0x02;
        assert_eq!(address(&compressed_tag), Err(EcdsaError::PointTag));
    }
}
