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

//! Keys to the kingdom.
//!
//! Ed25519 keys: a 32 byte seed, its SHA-512 expansion and the
//! compressed Edwards point it commits to.

use rand::{CryptoRng, RngCore};

mod public;
pub use public::{PublicKey, PUBLIC_KEY_LENGTH};

mod secret;
pub(crate) use secret::ExpandedSecret;
pub use secret::{PrivateKey, PRIVATE_KEY_LENGTH, SEED_LENGTH};

/// Draw a seed from `csprng` and derive its key pair.
pub fn generate_key<R>(csprng: &mut R) -> (PrivateKey, PublicKey)
where
    R: CryptoRng + RngCore,
{
    let private_key = PrivateKey::generate(csprng);
    let public_key = private_key.public_key();
    (private_key, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    #[test]
    fn test_generated_keys_match() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        let (sk, pk) = generate_key(&mut csprng);

        assert_eq!(sk.public_key(), pk);
        assert_eq!(PrivateKey::from_seed(sk.seed()).public_key(), pk);
    }

    #[test]
    fn test_zero_seed_is_not_identity() {
        let sk = PrivateKey::from_seed(&[0u8; SEED_LENGTH]);
        assert!(!sk.public_key().as_point().is_identity());
    }
}
