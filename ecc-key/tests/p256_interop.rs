//! Cross-checks against the fixed-curve `p256` crate.

use ecc_key::{
    EcPrivateKey, EcPublicKey, NamedCurve, PointFormat, ecdh,
    ecdsa::{Signature, sign_prehash, verify_prehash},
    num_bigint::BigUint,
};
use hex_literal::hex;
use p256::{
    ecdsa::{
        SigningKey, VerifyingKey,
        signature::{Signer, Verifier},
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use sha2::{Digest, Sha256};

const ALICE: [u8; 32] = hex!("C9AFA9D845BA75166B5C215767B1D6934E50C3DB36E89B127B8A622B120F6721");
const BOB: [u8; 32] = hex!("0F56DB78CA460B055C500064824BED999A25AAF48EBB519AC201537B85479813");

fn ours(scalar: &[u8; 32]) -> EcPrivateKey {
    EcPrivateKey::from_private_scalar(
        NamedCurve::Secp256r1.domain().unwrap(),
        &BigUint::from_bytes_be(scalar),
    )
    .unwrap()
}

fn theirs(scalar: &[u8; 32]) -> p256::SecretKey {
    p256::SecretKey::from_slice(scalar).unwrap()
}

#[test]
fn public_keys_agree() {
    for scalar in [ALICE, BOB] {
        let expected = theirs(&scalar).public_key();

        let key = ours(&scalar);
        assert_eq!(
            key.public_key().to_sec1_bytes(PointFormat::Uncompressed),
            expected.to_encoded_point(false).as_bytes()
        );
        assert_eq!(
            key.public_key().x509_public_bytes(),
            expected.to_encoded_point(true).as_bytes()
        );
    }
}

#[test]
fn shared_secrets_agree() {
    let alice = ours(&ALICE);
    let bob_public = theirs(&BOB).public_key();
    let bob_public_ours = EcPublicKey::from_sec1_bytes(
        alice.domain().clone(),
        bob_public.to_encoded_point(false).as_bytes(),
    )
    .unwrap();

    let shared = ecdh::diffie_hellman(&alice, &bob_public_ours).unwrap();
    let expected = p256::ecdh::diffie_hellman(
        theirs(&BOB).to_nonzero_scalar(),
        theirs(&ALICE).public_key().as_affine(),
    );

    assert_eq!(shared.raw_secret_bytes(), expected.raw_secret_bytes().as_slice());
}

#[test]
fn our_signatures_verify_with_p256() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let key = ours(&ALICE);
    let msg = b"example message";

    let sig = sign_prehash(&key, &mut rng, &Sha256::digest(msg)).unwrap();
    let sig = p256::ecdsa::Signature::from_slice(&sig.to_bytes(key.domain())).unwrap();

    let verifying_key =
        VerifyingKey::from_sec1_bytes(&key.public_key().x509_public_bytes()).unwrap();
    assert!(verifying_key.verify(msg, &sig).is_ok());
}

#[test]
fn p256_signatures_verify_with_ours() {
    let key = ours(&BOB);
    let signing_key = SigningKey::from_slice(&BOB).unwrap();
    let msg = b"example message";

    let sig: p256::ecdsa::Signature = signing_key.sign(msg);
    let der = sig.to_der();
    let sig = Signature::from_der(der.as_bytes()).unwrap();

    assert!(verify_prehash(key.public_key(), &Sha256::digest(msg), &sig));
    assert!(!verify_prehash(key.public_key(), &Sha256::digest(b"tampered"), &sig));
}
