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

//! Collective Ed25519 signing with a leader and a set of witnesses.
//!
//! A round runs in four steps:
//!
//! 1. every witness draws a one-time nonce `v_i` and sends `V_i = v_i B`;
//! 2. the leader sums the enabled `V_i` into the challenge `c`;
//! 3. every witness answers `s_i = H(c || aggAllX || M) a_i + v_i`;
//! 4. the leader checks each `s_i` on its own, disables the cosigners whose
//!    part fails, and emits `c || sum(s_i) || aggNonceCommit || mask`.
//!
//! A cosigner dropped in step 4 already contributed `V_i` to `c`. Its
//! commitment is collected in aggNonceCommit, which the verifier subtracts
//! from `c` before checking `S B - h aggX`. `aggAllX`, the sum over every
//! participant, is only ever used as hashing context, so it does not change
//! when cosigners drop out.
//!
//! Misuse of the protocol (answering twice with one nonce, wrong sized
//! challenges, commitment lists that do not match the participant list)
//! panics. Misbehaving cosigners never do: they are pruned and the round
//! goes on with a lower count.

use rand::{CryptoRng, RngCore};

use crate::errors::SignatureError;

mod commitment;
pub use commitment::{Commitment, SignaturePart, COMMITMENT_LENGTH, SIGNATURE_PART_LENGTH};

mod leader;
pub use leader::CosignLeader;

mod verify;
pub use verify::{agg_verify, count_enabled, AGGREGATE_SIGNATURE_HEADER_LENGTH};

mod witness;
pub use witness::Cosigner;

/// The length of an aggregate public key, `aggX || aggAllX`.
pub const AGGREGATE_PUBLIC_KEY_LENGTH: usize = 64;

/// State of one cosigner in the participation mask.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaskBit {
    /// Contributes to the aggregate (bit clear)
    Enabled,
    /// Left out of the aggregate (bit set)
    Disabled,
}

impl From<bool> for MaskBit {
    fn from(bit: bool) -> MaskBit {
        if bit {
            MaskBit::Disabled
        } else {
            MaskBit::Enabled
        }
    }
}

impl From<MaskBit> for bool {
    fn from(bit: MaskBit) -> bool {
        bit == MaskBit::Disabled
    }
}

/// The cosigner role.
pub trait Witness {
    /// Draw a fresh one-time nonce and return its commitment.
    fn commit<R>(&mut self, csprng: &mut R) -> Commitment
    where
        R: RngCore + CryptoRng;

    /// Answer a challenge with the nonce from the last `commit`.
    ///
    /// # Panics
    ///
    /// If the nonce was already used, or `challenge` is not 32 bytes, or
    /// `agg_public_key` is not 64 bytes.
    fn response(&mut self, message: &[u8], challenge: &[u8], agg_public_key: &[u8]) -> SignaturePart;

    /// Check an aggregate signature against a threshold.
    fn agg_verify(
        &self,
        threshold: usize,
        message: &[u8],
        signature: &[u8],
        agg_public_key: &[u8],
    ) -> Result<(), SignatureError>;
}

/// The aggregating role.
pub trait Leader {
    /// Aggregate the commitments of the enabled cosigners.
    fn challenge(&mut self, commits: &mut [Commitment]) -> Result<Commitment, SignatureError>;

    /// Sum the enabled parts into the collective signature.
    fn agg_sign(&self, challenge: &Commitment, parts: &[Option<SignaturePart>]) -> Vec<u8>;

    /// Check cosigner `index`, disabling it on failure.
    fn verify_part_sign(
        &mut self,
        message: &[u8],
        challenge: &Commitment,
        index: usize,
        commit: &Commitment,
        part: Option<&SignaturePart>,
    ) -> bool;

    /// `aggX || aggAllX`
    fn get_agg_public_key(&self) -> [u8; AGGREGATE_PUBLIC_KEY_LENGTH];

    /// Leave cosigner `signer` out of the aggregate.
    fn set_disable(&mut self, signer: usize);

    /// Re-enable every cosigner and forget folded commitments.
    fn clear_status(&mut self);
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    use crate::errors::CosignError;
    use crate::keys::{generate_key, PrivateKey, PublicKey};

    struct Session {
        witnesses: Vec<Cosigner>,
        leader: CosignLeader,
    }

    fn session(n: usize, csprng: &mut ChaChaRng) -> Session {
        let pairs: Vec<(PrivateKey, PublicKey)> = (0..n).map(|_| generate_key(csprng)).collect();
        let publics: Vec<PublicKey> = pairs.iter().map(|(_, pk)| *pk).collect();
        Session {
            leader: CosignLeader::new(&publics).unwrap(),
            witnesses: pairs.into_iter().map(|(sk, _)| Cosigner::new(sk)).collect(),
        }
    }

    /// Runs commit, challenge and response, returning the challenge, the
    /// commitments as the leader saw them and every witness's part.
    fn run_round(
        s: &mut Session,
        message: &[u8],
        csprng: &mut ChaChaRng,
        drop_commit: Option<usize>,
    ) -> (Commitment, Vec<Commitment>, Vec<SignaturePart>) {
        let mut commits: Vec<Commitment> = s.witnesses.iter_mut().map(|w| w.commit(csprng)).collect();
        if let Some(i) = drop_commit {
            commits[i] = Commitment::missing();
        }
        let c = s.leader.challenge(&mut commits).unwrap();
        let agg = s.leader.get_agg_public_key();
        let parts = s
            .witnesses
            .iter_mut()
            .map(|w| w.response(message, c.as_bytes(), &agg))
            .collect();
        (c, commits, parts)
    }

    #[test]
    fn all_enabled() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let mut s = session(5, &mut csprng);
        let message = b"test message";

        let (c, commits, parts) = run_round(&mut s, message, &mut csprng, None);
        for i in 0..5 {
            assert!(
                s.leader.verify_part_sign(message, &c, i, &commits[i], Some(&parts[i])),
                "Verification of a valid signature failed!"
            );
        }
        let parts: Vec<Option<SignaturePart>> = parts.into_iter().map(Some).collect();
        let sig = s.leader.agg_sign(&c, &parts);
        let agg = s.leader.get_agg_public_key();

        assert_eq!(sig.len(), AGGREGATE_SIGNATURE_HEADER_LENGTH + 1);
        assert!(s.witnesses[0].agg_verify(5, message, &sig, &agg).is_ok(), "Verification of a valid signature failed!");
        assert!(
            agg_verify(5, b"wrong message", &sig, &agg).is_err(),
            "Verification of a signature on a different message passed!"
        );
        assert_eq!(
            agg_verify(6, message, &sig, &agg),
            Err(CosignError::ThresholdNotMet { enabled: 5, threshold: 6 }.into())
        );
    }

    #[test]
    fn disabled_before_challenge() {
        let mut csprng = ChaChaRng::from_seed([1u8; 32]);
        let mut s = session(5, &mut csprng);
        let message = b"test message";

        s.leader.set_disable(1);
        let (c, commits, parts) = run_round(&mut s, message, &mut csprng, None);
        for i in [0usize, 2, 3, 4].iter() {
            assert!(s.leader.verify_part_sign(message, &c, *i, &commits[*i], Some(&parts[*i])));
        }
        let parts: Vec<Option<SignaturePart>> = parts
            .into_iter()
            .enumerate()
            .map(|(i, p)| if i == 1 { None } else { Some(p) })
            .collect();
        let sig = s.leader.agg_sign(&c, &parts);
        let agg = s.leader.get_agg_public_key();

        assert!(agg_verify(4, message, &sig, &agg).is_ok(), "Verification of a valid signature failed!");
        assert!(agg_verify(5, message, &sig, &agg).is_err());
    }

    #[test]
    fn forged_part_is_pruned() {
        let mut csprng = ChaChaRng::from_seed([2u8; 32]);
        let mut s = session(5, &mut csprng);
        let message = b"test message";

        let (c, commits, mut parts) = run_round(&mut s, message, &mut csprng, None);
        parts[3] = SignaturePart::from_bytes(&[1u8; 32]).unwrap();

        for i in 0..5 {
            assert_eq!(s.leader.verify_part_sign(message, &c, i, &commits[i], Some(&parts[i])), i != 3);
        }
        assert_eq!(s.leader.mask_bit(3), MaskBit::Disabled);

        let parts: Vec<Option<SignaturePart>> = parts.into_iter().map(Some).collect();
        let sig = s.leader.agg_sign(&c, &parts);
        let agg = s.leader.get_agg_public_key();

        assert!(agg_verify(4, message, &sig, &agg).is_ok(), "Verification of a valid signature failed!");
        assert!(agg_verify(5, message, &sig, &agg).is_err());
    }

    #[test]
    fn threshold_with_missing_and_corrupted_members() {
        let mut csprng = ChaChaRng::from_seed([4u8; 32]);
        let mut s = session(10, &mut csprng);
        let message = b"Hello World";

        let (c, commits, mut parts) = run_round(&mut s, message, &mut csprng, Some(9));
        assert!(commits[9].is_well_formed());

        let mut corrupted = parts[2].to_bytes();
        corrupted[0] ^= 1;
        parts[2] = SignaturePart::from_bytes(&corrupted).unwrap();

        for i in 0..10 {
            let ok = s.leader.verify_part_sign(message, &c, i, &commits[i], Some(&parts[i]));
            assert_eq!(ok, i != 2 && i != 9, "error part signature: {}", i);
        }

        let parts: Vec<Option<SignaturePart>> = parts.into_iter().map(Some).collect();
        let sig = s.leader.agg_sign(&c, &parts);
        let agg = s.leader.get_agg_public_key();

        assert!(agg_verify(8, message, &sig, &agg).is_ok(), "Verification of a valid signature failed!");
        assert!(agg_verify(9, message, &sig, &agg).is_err());
    }

    #[test]
    fn tampered_signature_fails() {
        let mut csprng = ChaChaRng::from_seed([5u8; 32]);
        let mut s = session(3, &mut csprng);
        let message = b"test message";

        let (c, commits, parts) = run_round(&mut s, message, &mut csprng, None);
        for i in 0..3 {
            assert!(s.leader.verify_part_sign(message, &c, i, &commits[i], Some(&parts[i])));
        }
        let parts: Vec<Option<SignaturePart>> = parts.into_iter().map(Some).collect();
        let sig = s.leader.agg_sign(&c, &parts);
        let agg = s.leader.get_agg_public_key();

        let mut flipped = sig.clone();
        flipped[40] ^= 0x10;
        assert!(agg_verify(3, message, &flipped, &agg).is_err());

        // claiming more cosigners than actually signed
        let mut other = agg;
        other[..32].copy_from_slice(&crate::curve25519::ED25519_BASEPOINT.compress());
        assert!(agg_verify(3, message, &sig, &other).is_err());
    }

    #[test]
    fn leader_recovers_after_clear_status() {
        let mut csprng = ChaChaRng::from_seed([6u8; 32]);
        let mut s = session(4, &mut csprng);
        let message = b"test message";

        let (c, commits, mut parts) = run_round(&mut s, message, &mut csprng, None);
        parts[0] = SignaturePart::from_bytes(&[1u8; 32]).unwrap();
        assert!(!s.leader.verify_part_sign(message, &c, 0, &commits[0], Some(&parts[0])));
        assert!(!s.leader.verify_part_sign(message, &c, 1, &commits[1], None));

        s.leader.clear_status();
        assert_eq!(count_enabled(s.leader.mask()), 4);

        let (c, commits, parts) = run_round(&mut s, message, &mut csprng, None);
        for i in 0..4 {
            assert!(s.leader.verify_part_sign(message, &c, i, &commits[i], Some(&parts[i])));
        }
        let parts: Vec<Option<SignaturePart>> = parts.into_iter().map(Some).collect();
        let sig = s.leader.agg_sign(&c, &parts);
        assert!(agg_verify(4, message, &sig, &s.leader.get_agg_public_key()).is_ok());
    }

    #[test]
    #[should_panic(expected = "no signature part")]
    fn enabled_cosigner_needs_a_part() {
        let mut csprng = ChaChaRng::from_seed([7u8; 32]);
        let mut s = session(2, &mut csprng);
        let (c, _, parts) = run_round(&mut s, b"test message", &mut csprng, None);
        let _ = s.leader.agg_sign(&c, &[Some(parts[0]), None]);
    }

    #[test]
    fn mask_bits() {
        assert_eq!(MaskBit::from(false), MaskBit::Enabled);
        assert_eq!(MaskBit::from(true), MaskBit::Disabled);
        assert!(bool::from(MaskBit::Disabled));
    }
}
