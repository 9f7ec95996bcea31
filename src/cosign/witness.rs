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

//! The cosigner side of a round: commit, then respond exactly once.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::cosign::commitment::{Commitment, SignaturePart, COMMITMENT_LENGTH};
use crate::cosign::verify::{agg_verify, cosign_challenge};
use crate::cosign::{Witness, AGGREGATE_PUBLIC_KEY_LENGTH};
use crate::curve25519::{mul_base, Scalar};
use crate::errors::SignatureError;
use crate::keys::PrivateKey;

/// The one-time nonce behind a commitment.
struct Secret {
    reduced: Scalar,
    valid: bool,
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.reduced.zeroize();
    }
}

/// A cosigner holding one Ed25519 key.
pub struct Cosigner {
    private_key: PrivateKey,
    secret: Option<Secret>,
}

impl Cosigner {
    /// A cosigner signing with `private_key`.
    pub fn new(private_key: PrivateKey) -> Cosigner {
        Cosigner {
            private_key,
            secret: None,
        }
    }

    /// The key this cosigner answers for.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl Witness for Cosigner {
    fn commit<R>(&mut self, csprng: &mut R) -> Commitment
    where
        R: RngCore + CryptoRng,
    {
        let mut secret_full = [0u8; 64];
        csprng.fill_bytes(&mut secret_full);
        let reduced = Scalar::from_bytes_mod_order_wide(&secret_full);
        secret_full.zeroize();

        let commitment = Commitment::from_point(&mul_base(&reduced));
        // a new commit replaces any unanswered one
        self.secret = Some(Secret {
            reduced,
            valid: true,
        });
        commitment
    }

    fn response(&mut self, message: &[u8], challenge: &[u8], agg_public_key: &[u8]) -> SignaturePart {
        if challenge.len() != COMMITMENT_LENGTH {
            panic!("cosign: bad challenge length: {}", challenge.len());
        }
        if agg_public_key.len() != AGGREGATE_PUBLIC_KEY_LENGTH {
            panic!("cosign: bad aggregate public key length: {}", agg_public_key.len());
        }

        let secret = match self.secret {
            Some(ref mut secret) if secret.valid => secret,
            _ => panic!("cosign: a cosigning secret must be used only once"),
        };

        let h = cosign_challenge(challenge, &agg_public_key[32..], message);
        let expanded = self.private_key.expand();
        let s = Scalar::mul_add(&h, &expanded.key, &secret.reduced);

        secret.reduced.zeroize();
        secret.valid = false;

        SignaturePart(s)
    }

    fn agg_verify(
        &self,
        threshold: usize,
        message: &[u8],
        signature: &[u8],
        agg_public_key: &[u8],
    ) -> Result<(), SignatureError> {
        agg_verify(threshold, message, signature, agg_public_key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    use crate::cosign::{CosignLeader, Leader};
    use crate::keys::generate_key;

    #[test]
    #[should_panic(expected = "used only once")]
    fn secret_cannot_be_reused() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let (sk, pk) = generate_key(&mut csprng);
        let mut leader = CosignLeader::new(&[pk]).unwrap();
        let mut witness = Cosigner::new(sk);

        let mut commits = vec![witness.commit(&mut csprng)];
        let c = leader.challenge(&mut commits).unwrap();
        let agg = leader.get_agg_public_key();

        let _ = witness.response(b"test message", c.as_bytes(), &agg);
        let _ = witness.response(b"test message", c.as_bytes(), &agg);
    }

    #[test]
    #[should_panic(expected = "used only once")]
    fn response_needs_a_commit() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let (sk, _) = generate_key(&mut csprng);
        let mut witness = Cosigner::new(sk);
        let _ = witness.response(b"test message", &[0u8; 32], &[0u8; 64]);
    }

    #[test]
    #[should_panic(expected = "bad challenge length")]
    fn short_challenge_panics() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let (sk, _) = generate_key(&mut csprng);
        let mut witness = Cosigner::new(sk);
        let _ = witness.commit(&mut csprng);
        let _ = witness.response(b"test message", &[0u8; 31], &[0u8; 64]);
    }

    #[test]
    fn commitments_are_fresh() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let (sk, _) = generate_key(&mut csprng);
        let mut witness = Cosigner::new(sk);
        let first = witness.commit(&mut csprng);
        let second = witness.commit(&mut csprng);
        assert!(first.is_well_formed());
        assert_ne!(first, second);
    }
}
