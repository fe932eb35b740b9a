use ark_bn254::{Bn254, Fr, G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::FftField;
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::UniformRand;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use zkp_airdrop_verifier::{
    groth16::{Groth16Proof, Groth16VerificationKey},
    leaf_hash,
    plonk::{PlonkProof, PlonkVerificationKey},
    poseidon::poseidon3,
    Groth16Verifier, MembershipCircuit, MembershipWitness, MerkleTree, PlonkVerifier,
    ProofVerifier, Secret,
};

fn bench_poseidon(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let (a, b) = (Fr::rand(&mut rng), Fr::rand(&mut rng));
    c.bench_function("poseidon3", |bench| {
        bench.iter(|| black_box(poseidon3(black_box(a), black_box(b), Fr::from(0u64))))
    });
}

fn bench_merkle_tree_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_tree_construction");
    group.sample_size(10);

    for leaf_count in [16, 256, 4096].iter() {
        let leaves: Vec<Fr> = (0..*leaf_count as u64)
            .map(|i| leaf_hash(Fr::from(i + 1)).unwrap())
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(leaf_count),
            &leaves,
            |b, leaves| b.iter(|| black_box(MerkleTree::new(leaves.clone()).unwrap())),
        );
    }
    group.finish();
}

fn bench_groth16_verification(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let recipients: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
    let leaves = recipients.iter().map(|r| leaf_hash(*r).unwrap()).collect();
    let tree = MerkleTree::with_depth(leaves, 3).unwrap();
    let path = tree.generate_proof(5).unwrap();
    let witness = MembershipWitness::from_merkle_proof(
        Secret::from_field(Fr::rand(&mut rng)),
        recipients[5],
        &path,
    )
    .unwrap();
    let circuit = MembershipCircuit::new(witness).unwrap();
    let public = circuit.public.to_words();

    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit.clone(), &mut rng).unwrap();
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();
    let verifier = Groth16Verifier::new(Arc::new(Groth16VerificationKey {
        alpha_g1: vk.alpha_g1,
        beta_g2: vk.beta_g2,
        gamma_g2: vk.gamma_g2,
        delta_g2: vk.delta_g2,
        ic: vk.gamma_abc_g1,
    }));
    let words = Groth16Proof {
        a: proof.a,
        b: proof.b,
        c: proof.c,
    }
    .to_words();

    c.bench_function("groth16_verify", |b| {
        b.iter(|| black_box(verifier.verify(black_box(&words), black_box(&public))))
    });
}

fn random_point(rng: &mut StdRng) -> G1Affine {
    (G1Affine::generator() * Fr::rand(rng)).into_affine()
}

/// Full PLONK pipeline on a random key; the final pairing fails, so this
/// measures the rejection path, which costs the same as acceptance.
fn bench_plonk_verification(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let power = 11;
    let key = PlonkVerificationKey {
        power,
        n_public: 3,
        k1: Fr::from(2u64),
        k2: Fr::from(3u64),
        qm: random_point(&mut rng),
        ql: random_point(&mut rng),
        qr: random_point(&mut rng),
        qo: random_point(&mut rng),
        qc: random_point(&mut rng),
        s1: random_point(&mut rng),
        s2: random_point(&mut rng),
        s3: random_point(&mut rng),
        x2: (G2Affine::generator() * Fr::rand(&mut rng)).into_affine(),
        omega: Fr::get_root_of_unity(1u64 << power).unwrap(),
    };
    let proof = PlonkProof {
        a: random_point(&mut rng),
        b: random_point(&mut rng),
        c: random_point(&mut rng),
        z: random_point(&mut rng),
        t1: random_point(&mut rng),
        t2: random_point(&mut rng),
        t3: random_point(&mut rng),
        wxi: random_point(&mut rng),
        wxiw: random_point(&mut rng),
        eval_a: Fr::rand(&mut rng),
        eval_b: Fr::rand(&mut rng),
        eval_c: Fr::rand(&mut rng),
        eval_s1: Fr::rand(&mut rng),
        eval_s2: Fr::rand(&mut rng),
        eval_zw: Fr::rand(&mut rng),
    };
    let words = proof.to_words();
    let public: Vec<_> = (1..=3u64).map(ethers::types::U256::from).collect();
    let verifier = PlonkVerifier::new(Arc::new(key));

    c.bench_function("plonk_decode", |b| {
        b.iter(|| black_box(PlonkProof::from_words(black_box(&words)).unwrap()))
    });
    c.bench_function("plonk_verify", |b| {
        b.iter(|| black_box(verifier.verify(black_box(&words), black_box(&public))))
    });
}

criterion_group!(
    benches,
    bench_poseidon,
    bench_merkle_tree_construction,
    bench_groth16_verification,
    bench_plonk_verification
);
criterion_main!(benches);
