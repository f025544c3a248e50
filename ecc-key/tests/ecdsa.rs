//! ECDSA signing and verification over runtime curves.

use ecc_key::{
    EcPrivateKey, ErrorKind, NamedCurve,
    ecdsa::{Signature, sign_prehash, verify_prehash},
    num_bigint::BigUint,
};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use sha2::{Digest, Sha256, Sha384, Sha512};

const MSG: &[u8] = b"sample";

fn rng() -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(0x5eed)
}

#[test]
fn sign_and_verify_across_curves() {
    let mut rng = rng();

    for curve in [
        NamedCurve::Secp256r1,
        NamedCurve::Secp384r1,
        NamedCurve::BrainpoolP256r1,
    ] {
        let key = EcPrivateKey::generate(curve.domain().unwrap(), &mut rng).unwrap();
        let digest = Sha256::digest(MSG);

        let sig = sign_prehash(&key, &mut rng, &digest).unwrap();
        assert!(verify_prehash(key.public_key(), &digest, &sig), "{curve}");

        let other = Sha256::digest(b"other");
        assert!(!verify_prehash(key.public_key(), &other, &sig), "{curve}");
    }
}

#[test]
fn digest_longer_than_order_is_truncated() {
    let mut rng = rng();
    let key = EcPrivateKey::generate(NamedCurve::Secp256r1.domain().unwrap(), &mut rng).unwrap();
    let digest = Sha512::digest(MSG);

    let sig = sign_prehash(&key, &mut rng, &digest).unwrap();
    assert!(verify_prehash(key.public_key(), &digest, &sig));

    // Only the leftmost 256 bits take part.
    let mut tweaked = digest;
    tweaked[63] ^= 1;
    assert!(verify_prehash(key.public_key(), &tweaked, &sig));
}

#[test]
fn wrong_key_fails() {
    let mut rng = rng();
    let domain = NamedCurve::Secp384r1.domain().unwrap();
    let signer = EcPrivateKey::generate(domain.clone(), &mut rng).unwrap();
    let other = EcPrivateKey::generate(domain, &mut rng).unwrap();
    let digest = Sha384::digest(MSG);

    let sig = sign_prehash(&signer, &mut rng, &digest).unwrap();
    assert!(!verify_prehash(other.public_key(), &digest, &sig));
}

#[test]
fn out_of_range_components_fail() {
    let mut rng = rng();
    let key = EcPrivateKey::generate(NamedCurve::Secp256r1.domain().unwrap(), &mut rng).unwrap();
    let digest = Sha256::digest(MSG);
    let sig = sign_prehash(&key, &mut rng, &digest).unwrap();
    let n = key.domain().order();

    let zero_r = Signature::from_scalars(BigUint::from(0u32), sig.s().clone());
    assert!(!verify_prehash(key.public_key(), &digest, &zero_r));

    let big_s = Signature::from_scalars(sig.r().clone(), sig.s() + n);
    assert!(!verify_prehash(key.public_key(), &digest, &big_s));
}

#[test]
fn signature_encodings() {
    let mut rng = rng();
    let domain = NamedCurve::Secp256r1.domain().unwrap();
    let key = EcPrivateKey::generate(domain.clone(), &mut rng).unwrap();
    let sig = sign_prehash(&key, &mut rng, &Sha256::digest(MSG)).unwrap();

    let fixed = sig.to_bytes(&domain);
    assert_eq!(fixed.len(), 64);
    assert_eq!(Signature::from_bytes(&domain, &fixed).unwrap(), sig);

    let der = sig.to_der().unwrap();
    assert_eq!(der[0], 0x30);
    assert_eq!(Signature::from_der(&der).unwrap(), sig);

    let err = Signature::from_bytes(&domain, &fixed[..63]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);

    let err = Signature::from_der(&fixed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);
}
