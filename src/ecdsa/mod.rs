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

//! ECDSA over secp256k1 and the NIST prime curves.
//!
//! One key model covers every curve. On secp256k1 signatures are the 65
//! byte recoverable form and a public key may be nothing but a 20 byte
//! address; everywhere else signatures are ASN.1 DER. Digests are signed
//! as given, hashing is up to the caller.

use core::fmt;
use core::str::FromStr;

use rand::{CryptoRng, RngCore};

use crate::errors::{EcdsaError, SignatureError};
use crate::pool::ScratchPool;

mod curves;
pub use curves::Curve;

mod private;
pub use private::EcdsaPrivateKey;

mod public;
pub use public::EcdsaPublicKey;

pub mod secp256k1;
pub use secp256k1::{ADDRESS_LENGTH, RECOVERABLE_SIGNATURE_LENGTH};

/// The ECDSA algorithms on offer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AlgorithmOption {
    /// secp256k1, recoverable signatures, explicit public keys
    Secp256k1,
    /// secp256k1 with public keys in address form
    Secp256k1Recover,
    /// NIST P-256
    Secp256r1,
    /// NIST P-384
    Secp384r1,
    /// NIST P-521
    Secp521r1,
}

impl AlgorithmOption {
    /// Every supported algorithm.
    pub const ALL: [AlgorithmOption; 5] = [
        AlgorithmOption::Secp256k1,
        AlgorithmOption::Secp256k1Recover,
        AlgorithmOption::Secp256r1,
        AlgorithmOption::Secp384r1,
        AlgorithmOption::Secp521r1,
    ];

    /// The curve behind the algorithm.
    pub fn curve(self) -> Curve {
        match self {
            AlgorithmOption::Secp256k1 | AlgorithmOption::Secp256k1Recover => Curve::Secp256k1,
            AlgorithmOption::Secp256r1 => Curve::P256,
            AlgorithmOption::Secp384r1 => Curve::P384,
            AlgorithmOption::Secp521r1 => Curve::P521,
        }
    }

    /// Numeric algorithm identifier.
    pub fn id(self) -> u16 {
        match self {
            AlgorithmOption::Secp256k1 => 0x0200,
            AlgorithmOption::Secp256r1 => 0x0300,
            AlgorithmOption::Secp384r1 => 0x0400,
            AlgorithmOption::Secp521r1 => 0x0500,
            AlgorithmOption::Secp256k1Recover => 0x0600,
        }
    }

    /// The algorithm with identifier `id`, if there is one.
    pub fn from_id(id: u16) -> Option<AlgorithmOption> {
        AlgorithmOption::ALL.iter().copied().find(|option| option.id() == id)
    }

    fn name(self) -> &'static str {
        match self {
            AlgorithmOption::Secp256k1 => "SECP256K1",
            AlgorithmOption::Secp256k1Recover => "SECP256K1RECOVER",
            AlgorithmOption::Secp256r1 => "SECP256R1",
            AlgorithmOption::Secp384r1 => "SECP384R1",
            AlgorithmOption::Secp521r1 => "SECP521R1",
        }
    }
}

impl fmt::Display for AlgorithmOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmOption {
    type Err = SignatureError;

    /// Parses the algorithm names; `SECP224R1` is known but not supported.
    fn from_str(s: &str) -> Result<AlgorithmOption, SignatureError> {
        AlgorithmOption::ALL
            .iter()
            .copied()
            .find(|option| option.name() == s)
            .ok_or_else(|| EcdsaError::UnsupportedAlgorithm(s.to_string()).into())
    }
}

/// Big-endian left padding to `len` bytes.
pub(crate) fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let n = bytes.len().min(len);
    out[len - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    out
}

/// Write the first 32 bytes of `digest` to `out`, left padded when shorter.
pub(crate) fn pad_or_cut(digest: &[u8], out: &mut [u8; 32]) {
    if digest.len() >= 32 {
        out.copy_from_slice(&digest[..32]);
    } else {
        let pad = 32 - digest.len();
        out[..pad].iter_mut().for_each(|b| *b = 0);
        out[pad..].copy_from_slice(digest);
    }
}

/// Sign and verify with one algorithm, starting from raw key bytes.
///
/// Keeping an `EcdsaPrivateKey` or `EcdsaPublicKey` around is faster when
/// the same key is used many times, as the key is only decoded once.
#[derive(Debug)]
pub struct Ecdsa {
    option: AlgorithmOption,
    pool: ScratchPool,
}

impl Ecdsa {
    /// A signer/verifier for `option`.
    pub fn new(option: AlgorithmOption) -> Ecdsa {
        Ecdsa {
            option,
            pool: ScratchPool::new(),
        }
    }

    /// The bound algorithm.
    pub fn option(&self) -> AlgorithmOption {
        self.option
    }

    /// Generate a fresh private key.
    pub fn generate_key<R>(&self, csprng: &mut R) -> Result<EcdsaPrivateKey, SignatureError>
    where
        R: RngCore + CryptoRng,
    {
        EcdsaPrivateKey::generate(self.option, &self.pool, csprng)
    }

    /// Sign `digest` with the big-endian private scalar `key`.
    pub fn sign(&self, key: &[u8], digest: &[u8]) -> Result<Vec<u8>, SignatureError> {
        EcdsaPrivateKey::from_bytes(key, self.option)?.sign_with(&self.pool, digest)
    }

    /// Verify `signature` over `digest` against encoded public key `key`.
    ///
    /// # Example
    ///
    /// ```
    /// # use ecsign::ecdsa::{AlgorithmOption, Ecdsa};
    /// # fn doctest() -> Result<(), ecsign::SignatureError> {
    /// let p256 = Ecdsa::new(AlgorithmOption::Secp256r1);
    /// let key = p256.generate_key(&mut rand::rngs::OsRng)?;
    /// let digest = [0x42u8; 32];
    ///
    /// let signature = p256.sign(&key.to_bytes(), &digest)?;
    /// p256.verify(&key.public_key().to_bytes(), &signature, &digest)?;
    /// # Ok(())
    /// # }
    /// # fn main() { doctest().unwrap(); }
    /// ```
    pub fn verify(&self, key: &[u8], signature: &[u8], digest: &[u8]) -> Result<(), SignatureError> {
        EcdsaPublicKey::from_bytes(key, self.option)?.verify(signature, digest)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    use crate::hash::{HashType, Hasher};

    #[test]
    fn option_names_and_ids() {
        for option in AlgorithmOption::ALL.iter() {
            assert_eq!(option.to_string().parse::<AlgorithmOption>().unwrap(), *option);
            assert_eq!(AlgorithmOption::from_id(option.id()), Some(*option));
        }
        assert_eq!(
            "SECP224R1".parse::<AlgorithmOption>(),
            Err(EcdsaError::UnsupportedAlgorithm("SECP224R1".to_string()).into())
        );
        assert_eq!(AlgorithmOption::from_id(0x0000), None);
        assert_eq!(AlgorithmOption::from_id(0x1000), None);
    }

    #[test]
    fn padding() {
        assert_eq!(left_pad(&[1, 2], 4), vec![0, 0, 1, 2]);
        assert_eq!(left_pad(&[], 2), vec![0, 0]);
        let mut out = [0xffu8; 32];
        pad_or_cut(&[9u8; 40], &mut out);
        assert_eq!(out, [9u8; 32]);
        let mut expected = [0u8; 32];
        expected[31] = 5;
        pad_or_cut(&[5], &mut out);
        assert_eq!(out, expected);
    }

    #[test]
    fn every_curve_signs_any_digest_length() {
        let mut csprng = ChaChaRng::from_seed([0u8; 32]);
        for option in AlgorithmOption::ALL.iter() {
            let ecdsa = Ecdsa::new(*option);
            let key = ecdsa.generate_key(&mut csprng).unwrap();
            let public = key.public_key().to_bytes();

            for len in [0usize, 1, 16, 20, 28, 31, 32, 33, 48, 64, 66, 80].iter() {
                let mut digest = vec![0u8; *len];
                csprng.fill_bytes(&mut digest);

                let signature = ecdsa.sign(&key.to_bytes(), &digest).unwrap();
                assert!(
                    ecdsa.verify(&public, &signature, &digest).is_ok(),
                    "Verification of a valid signature failed! {} with {} byte digest",
                    option,
                    len
                );
            }

            let digest = Hasher::new(HashType::Sha2_256).hash(b"test message");
            let wrong = Hasher::new(HashType::Sha2_256).hash(b"wrong message");
            let signature = key.sign(&digest).unwrap();
            assert!(
                key.public_key().verify(&signature, &wrong).is_err(),
                "Verification of a signature on a different message passed!"
            );
        }
    }

    #[test]
    fn signature_forms() {
        let mut csprng = ChaChaRng::from_seed([1u8; 32]);
        let digest = [3u8; 32];

        let k1 = EcdsaPrivateKey::generate(AlgorithmOption::Secp256k1, &ScratchPool::new(), &mut csprng).unwrap();
        assert_eq!(k1.sign(&digest).unwrap().len(), RECOVERABLE_SIGNATURE_LENGTH);

        let r1 = EcdsaPrivateKey::generate(AlgorithmOption::Secp256r1, &ScratchPool::new(), &mut csprng).unwrap();
        let der = r1.sign(&digest).unwrap();
        assert_eq!(der[0], 0x30);
        assert!(Curve::P256.is_der(&der));
    }

    #[test]
    fn known_key_signs_for_its_address() {
        let key = hex::decode("289c2857d4598e37fb9647507e47a309d6133539bf21a8b9cb6df88fd5232032").unwrap();
        let address = hex::decode("970e8128ab834e8eac17ab8e3812f010678cf791").unwrap();
        let digest = Hasher::new(HashType::Keccak256).hash(b"foo");

        let ecdsa = Ecdsa::new(AlgorithmOption::Secp256k1Recover);
        let signature = ecdsa.sign(&key, &digest).unwrap();
        assert!(ecdsa.verify(&address, &signature, &digest).is_ok(), "Verification of a valid signature failed!");

        let wrong = Hasher::new(HashType::Keccak256).hash(b"bar");
        assert_eq!(
            ecdsa.verify(&address, &signature, &wrong),
            Err(EcdsaError::InvalidSignature.into())
        );
    }

    #[test]
    fn recovery_modes() {
        let mut csprng = ChaChaRng::from_seed([2u8; 32]);
        let digest = hex::decode("c336dd3813da656a8ff31136a163809eaaf762cc5445b8de8299489301486009").unwrap();
        let ecdsa = Ecdsa::new(AlgorithmOption::Secp256k1Recover);

        let key = ecdsa.generate_key(&mut csprng).unwrap();
        let signature = key.sign(&digest).unwrap();
        assert_eq!(signature.len(), 65);

        // the address a recovery key encodes to verifies
        let address = key.public_key().to_bytes();
        assert_eq!(address.len(), ADDRESS_LENGTH);
        let by_address = EcdsaPublicKey::from_bytes(&address, AlgorithmOption::Secp256k1Recover).unwrap();
        assert!(by_address.verify(&signature, &digest).is_ok());

        // so does the full point under either secp256k1 option
        let point = key.public_key().uncompressed().unwrap().to_vec();
        for option in [AlgorithmOption::Secp256k1, AlgorithmOption::Secp256k1Recover].iter() {
            let explicit = EcdsaPublicKey::from_bytes(&point, *option).unwrap();
            assert!(!explicit.is_recover());
            assert!(explicit.verify(&signature, &digest).is_ok());
        }

        // another key's address does not
        let other = ecdsa.generate_key(&mut csprng).unwrap();
        let other = EcdsaPublicKey::from_bytes(&other.public_key().to_bytes(), AlgorithmOption::Secp256k1Recover).unwrap();
        assert_eq!(other.verify(&signature, &digest), Err(EcdsaError::InvalidSignature.into()));
    }

    #[test]
    fn recovery_round_trips() {
        let mut csprng = ChaChaRng::from_seed([3u8; 32]);
        let ecdsa = Ecdsa::new(AlgorithmOption::Secp256k1Recover);

        for _ in 0..1000 {
            let key = ecdsa.generate_key(&mut csprng).unwrap();
            let mut digest = [0u8; 32];
            csprng.fill_bytes(&mut digest);

            let signature = key.sign(&digest).unwrap();
            let recovered = secp256k1::recover_pubkey(&digest, &signature).unwrap();
            let explicit = secp256k1::scalar_base_mult(&key.to_bytes()).unwrap();
            assert_eq!(
                recovered[..],
                explicit[..],
                "recovery failed for key {}",
                hex::encode(&key.to_bytes()[..])
            );

            let address = key.public_key().to_bytes();
            assert_eq!(secp256k1::address(&recovered).unwrap()[..], address[..]);
            assert!(ecdsa.verify(&address, &signature, &digest).is_ok());
        }
    }

    #[test]
    fn facade_signs_with_pooled_scratch() {
        let key = hex::decode("289c2857d4598e37fb9647507e47a309d6133539bf21a8b9cb6df88fd5232032").unwrap();
        let digest = Hasher::new(HashType::Keccak256).hash(b"test message");

        let ecdsa = Ecdsa::new(AlgorithmOption::Secp256k1);
        let first = ecdsa.sign(&key, &digest).unwrap();
        assert_eq!(ecdsa.pool.idle(), (1, 0));
        let second = ecdsa.sign(&key, &digest).unwrap();
        assert_eq!(ecdsa.pool.idle(), (1, 0));
        assert_eq!(first, second);

        // the NIST curves never take a buffer
        let p256 = Ecdsa::new(AlgorithmOption::Secp256r1);
        p256.sign(&key, &digest).unwrap();
        assert_eq!(p256.pool.idle(), (0, 0));
    }

    #[test]
    fn malformed_public_keys_are_errors() {
        let ecdsa = Ecdsa::new(AlgorithmOption::Secp256k1Recover);
        let signature = [0u8; 65];
        assert_eq!(
            ecdsa.verify(&[4u8; 64], &signature, &[0u8; 32]),
            Err(EcdsaError::KeyLength(64).into())
        );
        assert_eq!(
            ecdsa.verify(&[4u8; 19], &signature, &[0u8; 32]),
            Err(EcdsaError::KeyLength(19).into())
        );
    }
}
