//! Property-based tests.

use cryptkit::{
    keccak::{KeccakPadding, KeccakState, KeccakWidth},
    HashAlgorithm, HashEngine, KeyHandle, RsaParameters, RsaSigner, SignatureAlgorithm,
    SignatureProvider,
};
use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use rsa::RsaPrivateKey;
use sha3::Digest;

prop_compose! {
    // WARNING: do *NOT* copy and paste this code. It's insecure and optimized for test speed.
    fn private_key()(seed in any::<[u8; 32]>()) -> RsaPrivateKey {
        let mut rng = ChaCha8Rng::from_seed(seed);
        RsaPrivateKey::new(&mut rng, 512).unwrap()
    }
}

fn width() -> impl Strategy<Value = KeccakWidth> {
    prop_oneof![
        Just(KeccakWidth::W224),
        Just(KeccakWidth::W256),
        Just(KeccakWidth::W384),
        Just(KeccakWidth::W512),
    ]
}

fn reference_digest(width: KeccakWidth, padding: KeccakPadding, msg: &[u8]) -> Vec<u8> {
    match (padding, width) {
        (KeccakPadding::Sha3, KeccakWidth::W224) => sha3::Sha3_224::digest(msg).to_vec(),
        (KeccakPadding::Sha3, KeccakWidth::W256) => sha3::Sha3_256::digest(msg).to_vec(),
        (KeccakPadding::Sha3, KeccakWidth::W384) => sha3::Sha3_384::digest(msg).to_vec(),
        (KeccakPadding::Sha3, KeccakWidth::W512) => sha3::Sha3_512::digest(msg).to_vec(),
        (KeccakPadding::Keccak, KeccakWidth::W224) => sha3::Keccak224::digest(msg).to_vec(),
        (KeccakPadding::Keccak, KeccakWidth::W256) => sha3::Keccak256::digest(msg).to_vec(),
        (KeccakPadding::Keccak, KeccakWidth::W384) => sha3::Keccak384::digest(msg).to_vec(),
        (KeccakPadding::Keccak, KeccakWidth::W512) => sha3::Keccak512::digest(msg).to_vec(),
    }
}

proptest! {
    #[test]
    fn keccak_matches_reference(
        width in width(),
        sha3 in any::<bool>(),
        msg in prop::collection::vec(any::<u8>(), 0..600),
        split in any::<prop::sample::Index>(),
    ) {
        let padding = if sha3 { KeccakPadding::Sha3 } else { KeccakPadding::Keccak };
        let expected = reference_digest(width, padding, &msg);

        let mut state = KeccakState::new(width, padding);
        state.update(&msg);
        prop_assert_eq!(&state.finalize_reset(), &expected);

        // Any split of the input gives the same digest, and the state is
        // clean after finalization.
        let at = split.index(msg.len() + 1);
        state.update(&msg[..at]);
        state.update(&msg[at..]);
        prop_assert_eq!(&state.finalize_reset(), &expected);
    }

    #[test]
    fn hashing_is_idempotent(
        msg in any::<Vec<u8>>(),
        key in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        for algorithm in HashAlgorithm::ALL {
            let mut engine = HashEngine::new_keyed(algorithm, &key).unwrap();
            let first = engine.compute(&msg);
            prop_assert_eq!(first.len(), algorithm.output_len());
            prop_assert_eq!(engine.compute(&msg), first);
        }
    }

    #[test]
    fn rsa_parameters_round_trip(private_key in private_key()) {
        let params = RsaParameters::try_from(&private_key).unwrap();
        for pkcs8 in [false, true] {
            let pem = params.to_private_pem(pkcs8, false).unwrap();
            prop_assert_eq!(RsaParameters::parse(&pem), Some(params.clone()));
        }
        prop_assert_eq!(RsaParameters::parse(&params.to_xml(true)), Some(params.clone()));
        prop_assert_eq!(
            RsaParameters::parse(&params.to_public_pem(false)),
            Some(params.to_public())
        );
        prop_assert_eq!(
            RsaParameters::parse(&params.to_ssh_public_key(Some("prop"))),
            Some(params.to_public())
        );
    }

    #[test]
    fn rsa_sign_roundtrip(private_key in private_key(), msg in any::<Vec<u8>>()) {
        let signer = RsaSigner::new(SignatureAlgorithm::Rs256, KeyHandle::Borrowed(&private_key)).unwrap();
        let mut signature = signer.sign(&msg).unwrap();
        prop_assert!(signer.verify(&msg, &signature));
        signature[0] ^= 0x80;
        prop_assert!(!signer.verify(&msg, &signature));
    }
}
