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

// -*- mode: rust; -*-
//
// Layout follows the ed25519-dalek benches.

#[macro_use]
extern crate criterion;

mod ed25519_benches {
    use criterion::Criterion;
    use ecsign::*;
    use rand::thread_rng;

    fn sign(c: &mut Criterion) {
        let (private, _) = generate_key(&mut thread_rng());
        let msg: &[u8] = b"yummy";

        c.bench_function("Ed25519 signing", move |b| b.iter(|| private.sign(msg)));
    }

    fn verify(c: &mut Criterion) {
        let (private, public) = generate_key(&mut thread_rng());
        let msg: &[u8] = b"yummy";
        let sig: Signature = private.sign(msg);

        c.bench_function("Ed25519 signature verification", move |b| {
            b.iter(|| public.verify(msg, &sig))
        });
    }

    fn key_generation(c: &mut Criterion) {
        c.bench_function("Ed25519 key generation", |b| {
            b.iter(|| generate_key(&mut thread_rng()))
        });
    }

    criterion_group! {
        name = ed25519_benches;
        config = Criterion::default();
        targets =
            sign,
            verify,
            key_generation,
    }
}

mod cosign_benches {
    use criterion::Criterion;
    use ecsign::*;
    use rand::thread_rng;

    static SIZES: [usize; 4] = [4, 16, 64, 128];

    fn round(c: &mut Criterion) {
        c.bench_function_over_inputs(
            "Cosigning round",
            |b, &&size| {
                let pairs: Vec<(PrivateKey, PublicKey)> = (0..size).map(|_| generate_key(&mut thread_rng())).collect();
                let publics: Vec<PublicKey> = pairs.iter().map(|(_, public)| *public).collect();
                let mut witnesses: Vec<Cosigner> = pairs.into_iter().map(|(private, _)| Cosigner::new(private)).collect();
                let msg: &[u8] = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

                b.iter(|| {
                    let mut leader = CosignLeader::new(&publics).unwrap();
                    let mut commits: Vec<Commitment> = witnesses.iter_mut().map(|w| w.commit(&mut thread_rng())).collect();
                    let challenge = leader.challenge(&mut commits).unwrap();
                    let agg = leader.get_agg_public_key();
                    let parts: Vec<Option<SignaturePart>> = witnesses
                        .iter_mut()
                        .enumerate()
                        .map(|(i, w)| {
                            let part = w.response(msg, challenge.as_bytes(), &agg);
                            if leader.verify_part_sign(msg, &challenge, i, &commits[i], Some(&part)) {
                                Some(part)
                            } else {
                                None
                            }
                        })
                        .collect();
                    leader.agg_sign(&challenge, &parts)
                });
            },
            &SIZES,
        );
    }

    fn aggregate_verification(c: &mut Criterion) {
        c.bench_function_over_inputs(
            "Cosigned signature verification",
            |b, &&size| {
                let pairs: Vec<(PrivateKey, PublicKey)> = (0..size).map(|_| generate_key(&mut thread_rng())).collect();
                let publics: Vec<PublicKey> = pairs.iter().map(|(_, public)| *public).collect();
                let mut witnesses: Vec<Cosigner> = pairs.into_iter().map(|(private, _)| Cosigner::new(private)).collect();
                let msg: &[u8] = b"yummy";

                let mut leader = CosignLeader::new(&publics).unwrap();
                let mut commits: Vec<Commitment> = witnesses.iter_mut().map(|w| w.commit(&mut thread_rng())).collect();
                let challenge = leader.challenge(&mut commits).unwrap();
                let agg = leader.get_agg_public_key();
                let parts: Vec<Option<SignaturePart>> = witnesses
                    .iter_mut()
                    .map(|w| Some(w.response(msg, challenge.as_bytes(), &agg)))
                    .collect();
                let sig = leader.agg_sign(&challenge, &parts);

                b.iter(|| agg_verify(size, msg, &sig, &agg))
            },
            &SIZES,
        );
    }

    criterion_group! {
        name = cosign_benches;
        config = Criterion::default();
        targets =
            round,
            aggregate_verification,
    }
}

mod ecdsa_benches {
    use criterion::Criterion;
    use ecsign::*;
    use rand::thread_rng;

    static OPTIONS: [AlgorithmOption; 4] = [
        AlgorithmOption::Secp256k1,
        AlgorithmOption::Secp256r1,
        AlgorithmOption::Secp384r1,
        AlgorithmOption::Secp521r1,
    ];

    fn sign(c: &mut Criterion) {
        c.bench_function_over_inputs(
            "ECDSA signing",
            |b, &&option| {
                let key = Ecdsa::new(option).generate_key(&mut thread_rng()).unwrap();
                let digest = Hasher::new(HashType::Keccak256).hash(b"yummy");
                b.iter(|| key.sign(&digest))
            },
            &OPTIONS,
        );
    }

    fn verify(c: &mut Criterion) {
        c.bench_function_over_inputs(
            "ECDSA signature verification",
            |b, &&option| {
                let key = Ecdsa::new(option).generate_key(&mut thread_rng()).unwrap();
                let digest = Hasher::new(HashType::Keccak256).hash(b"yummy");
                let sig = key.sign(&digest).unwrap();
                let public = key.public_key().clone();
                b.iter(|| public.verify(&sig, &digest))
            },
            &OPTIONS,
        );
    }

    fn recover_by_address(c: &mut Criterion) {
        let key = Ecdsa::new(AlgorithmOption::Secp256k1Recover)
            .generate_key(&mut thread_rng())
            .unwrap();
        let digest = Hasher::new(HashType::Keccak256).hash(b"yummy");
        let sig = key.sign(&digest).unwrap();
        let address = EcdsaPublicKey::from_bytes(&key.public_key().to_bytes(), AlgorithmOption::Secp256k1Recover).unwrap();

        c.bench_function("ECDSA secp256k1 address verification", move |b| {
            b.iter(|| address.verify(&sig, &digest))
        });
    }

    criterion_group! {
        name = ecdsa_benches;
        config = Criterion::default();
        targets =
            sign,
            verify,
            recover_by_address,
    }
}

criterion_main!(
    ed25519_benches::ed25519_benches,
    cosign_benches::cosign_benches,
    ecdsa_benches::ecdsa_benches
);
