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

//! The leader: aggregates commitments into a challenge and partial
//! signatures into a collective one, pruning cosigners that misbehave.

use tracing::{debug, warn};

use crate::cosign::commitment::{Commitment, SignaturePart, COMMITMENT_LENGTH};
use crate::cosign::verify::verify_relation;
use crate::cosign::{Leader, MaskBit, AGGREGATE_PUBLIC_KEY_LENGTH};
use crate::curve25519::{EdwardsPoint, Scalar};
use crate::errors::{CosignError, SignatureError};
use crate::keys::PrivateKey;

/// Leader state for one participant list.
///
/// Mask bit `i` lives in byte `i >> 3` at `1 << (i & 7)`; a set bit means
/// the cosigner is disabled. Bits past the last participant stay set.
///
/// Not meant to be shared between threads while a round is running.
pub struct CosignLeader {
    keys: Vec<EdwardsPoint>,
    mask: Vec<u8>,

    /// sum of the enabled keys
    agg_x: EdwardsPoint,
    /// sum of all keys, the hashing context
    agg_all_x: EdwardsPoint,

    /// commitments of cosigners dropped after the challenge
    agg_nonce_commit: EdwardsPoint,

    /// the points summed into the last challenge, by participant
    round: Vec<Option<EdwardsPoint>>,
}

#[inline]
fn mask_position(signer: usize) -> (usize, u8) {
    (signer >> 3, 1u8 << (signer & 7))
}

impl CosignLeader {
    /// Start a session over `public_keys`, every cosigner enabled.
    ///
    /// Fails if the list is empty or any key does not decode.
    pub fn new<K: AsRef<[u8]>>(public_keys: &[K]) -> Result<CosignLeader, SignatureError> {
        if public_keys.is_empty() {
            return Err(CosignError::NoParticipants.into());
        }

        let mut keys = Vec::with_capacity(public_keys.len());
        for (index, key) in public_keys.iter().enumerate() {
            let bytes = key.as_ref();
            let point = if bytes.len() == 32 {
                let mut buf = [0u8; 32];
                buf.copy_from_slice(bytes);
                EdwardsPoint::decompress(&buf)
            } else {
                None
            };
            match point {
                Some(point) => keys.push(point),
                None => return Err(CosignError::InvalidPoint { index }.into()),
            }
        }

        let mut mask = vec![0xffu8; (keys.len() + 7) >> 3];
        let mut agg_x = EdwardsPoint::identity();
        for (i, key) in keys.iter().enumerate() {
            let (byte, bit) = mask_position(i);
            mask[byte] &= !bit;
            agg_x = &agg_x + key;
        }

        Ok(CosignLeader {
            round: vec![None; keys.len()],
            keys,
            mask,
            agg_x,
            agg_all_x: agg_x,
            agg_nonce_commit: EdwardsPoint::identity(),
        })
    }

    /// Number of participants in the session.
    pub fn participants(&self) -> usize {
        self.keys.len()
    }

    /// The participation mask as it will appear in the signature.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Whether cosigner `signer` is currently enabled.
    pub fn mask_bit(&self, signer: usize) -> MaskBit {
        let (byte, bit) = mask_position(signer);
        MaskBit::from(self.mask[byte] & bit != 0)
    }

    fn fold_into_nonce_commit(&mut self, index: usize) {
        if let Some(point) = self.round[index].take() {
            self.agg_nonce_commit = &self.agg_nonce_commit + &point;
            debug!(index, "folded commitment into aggNonceCommit");
        }
    }

    fn filler_commitment() -> Commitment {
        let filler = PrivateKey::generate(&mut rand::thread_rng());
        Commitment::from_bytes(filler.public_key().as_bytes())
    }
}

impl Leader for CosignLeader {
    /// Sum the enabled cosigners' commitments.
    ///
    /// An enabled slot with the wrong length gets a random commitment
    /// written back into `commits`, which will never verify and so gets
    /// folded out later. Disabled slots are skipped.
    ///
    /// # Panics
    ///
    /// If `commits` does not have one entry per participant.
    fn challenge(&mut self, commits: &mut [Commitment]) -> Result<Commitment, SignatureError> {
        if commits.len() != self.keys.len() {
            panic!(
                "cosign: {} commitments for {} participants",
                commits.len(),
                self.keys.len()
            );
        }

        let mut round = vec![None; self.keys.len()];
        let mut agg_r = EdwardsPoint::identity();
        for (i, slot) in round.iter_mut().enumerate() {
            if self.mask_bit(i) == MaskBit::Disabled {
                continue;
            }

            if commits[i].as_bytes().len() != COMMITMENT_LENGTH {
                warn!(index = i, "missing commitment, substituting a random one");
                commits[i] = CosignLeader::filler_commitment();
            }

            let point = match commits[i].decompress() {
                Some(point) => point,
                None => return Err(CosignError::InvalidPoint { index: i }.into()),
            };
            agg_r = &agg_r + &point;
            *slot = Some(point);
        }

        self.round = round;
        Ok(Commitment::from_point(&agg_r))
    }

    /// # Panics
    ///
    /// If the challenge is not 32 bytes, or an enabled cosigner has no part.
    fn agg_sign(&self, challenge: &Commitment, parts: &[Option<SignaturePart>]) -> Vec<u8> {
        if challenge.as_bytes().len() != COMMITMENT_LENGTH {
            panic!("cosign: bad aggregate R length: {}", challenge.as_bytes().len());
        }

        let mut agg_s = Scalar::ZERO;
        for i in 0..self.keys.len() {
            if self.mask_bit(i) == MaskBit::Disabled {
                continue;
            }
            match parts.get(i) {
                Some(Some(part)) => agg_s = &agg_s + &part.0,
                _ => panic!("cosign: no signature part for enabled cosigner {}", i),
            }
        }

        let mut signature = Vec::with_capacity(96 + self.mask.len());
        signature.extend_from_slice(challenge.as_bytes());
        signature.extend_from_slice(&agg_s.to_bytes());
        signature.extend_from_slice(&self.agg_nonce_commit.compress());
        signature.extend_from_slice(&self.mask);
        signature
    }

    /// Check one cosigner's part against its own key and commitment.
    ///
    /// A failing cosigner is disabled, and if its commitment went into the
    /// challenge that commitment moves into aggNonceCommit.
    fn verify_part_sign(
        &mut self,
        message: &[u8],
        challenge: &Commitment,
        index: usize,
        commit: &Commitment,
        part: Option<&SignaturePart>,
    ) -> bool {
        let valid = match (commit.to_array(), part) {
            (Some(expected_r), Some(part)) if challenge.is_well_formed() => {
                let agg_all_x = self.agg_all_x.compress();
                verify_relation(
                    message,
                    challenge.as_bytes(),
                    &expected_r,
                    &part.0,
                    &self.keys[index],
                    &agg_all_x,
                )
            }
            _ => false,
        };

        if !valid {
            self.fold_into_nonce_commit(index);
            self.set_disable(index);
        }
        valid
    }

    fn get_agg_public_key(&self) -> [u8; AGGREGATE_PUBLIC_KEY_LENGTH] {
        let mut out = [0u8; AGGREGATE_PUBLIC_KEY_LENGTH];
        out[..32].copy_from_slice(&self.agg_x.compress());
        out[32..].copy_from_slice(&self.agg_all_x.compress());
        out
    }

    fn set_disable(&mut self, signer: usize) {
        let (byte, bit) = mask_position(signer);
        if self.mask[byte] & bit == 0 {
            self.mask[byte] |= bit;
            self.agg_x = &self.agg_x - &self.keys[signer];
            debug!(signer, "disabled cosigner");
        }
    }

    fn clear_status(&mut self) {
        for i in 0..self.keys.len() {
            let (byte, bit) = mask_position(i);
            if self.mask[byte] & bit != 0 {
                self.mask[byte] &= !bit;
                self.agg_x = &self.agg_x + &self.keys[i];
                debug!(signer = i, "re-enabled cosigner");
            }
        }
        self.agg_nonce_commit = EdwardsPoint::identity();
        self.round = vec![None; self.keys.len()];
    }
}
