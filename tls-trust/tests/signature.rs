//! Signature bridge tests.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use tls_trust::{
    DigestScheme, ErrorKind, SignatureFormat,
    ecc_key::{EcKey, EcPrivateKey, NamedCurve},
    signature::{Signer, Verifier, sign, verify},
};

const MSG: &[u8] = b"client finished transcript hash";

fn key(curve: NamedCurve) -> EcKey {
    let mut rng = ChaCha20Rng::seed_from_u64(0x7369_676e);
    EcPrivateKey::generate(curve.domain().unwrap(), &mut rng)
        .unwrap()
        .into()
}

#[test]
fn sign_and_verify() {
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    for (curve, scheme) in [
        (NamedCurve::Secp256r1, DigestScheme::Sha256),
        (NamedCurve::Secp384r1, DigestScheme::Sha384),
        (NamedCurve::Secp521r1, DigestScheme::Sha512),
    ] {
        let key = key(curve);
        let public = key.public_key();

        for format in [SignatureFormat::Ieee1363, SignatureFormat::DerSequence] {
            let sig = sign(&key, &mut rng, scheme, format, MSG).unwrap();

            if format == SignatureFormat::Ieee1363 {
                assert_eq!(sig.len(), 2 * public.domain().order_bytes());
            } else {
                assert_eq!(sig[0], 0x30);
            }

            assert!(verify(public, scheme, format, MSG, &sig).unwrap());
            assert!(!verify(public, scheme, format, b"other message", &sig).unwrap());
        }
    }
}

#[test]
fn wrong_format_or_key() {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let key = key(NamedCurve::Secp256r1);
    let signer = Signer::new(&key, DigestScheme::Sha256, SignatureFormat::Ieee1363).unwrap();
    let sig = signer.sign_message(&mut rng, MSG).unwrap();

    let der = Verifier::new(key.public_key(), DigestScheme::Sha256, SignatureFormat::DerSequence)
        .unwrap();
    assert!(!der.verify_message(MSG, &sig));

    let other = EcPrivateKey::generate(NamedCurve::Secp256r1.domain().unwrap(), &mut rng).unwrap();
    let verifier =
        Verifier::new(other.public_key(), DigestScheme::Sha256, SignatureFormat::Ieee1363).unwrap();
    assert!(!verifier.verify_message(MSG, &sig));
    assert!(!verifier.verify_message(MSG, &sig[1..]));
}

#[test]
fn digest_too_weak_for_key() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let key = key(NamedCurve::Secp384r1);

    let err = sign(&key, &mut rng, DigestScheme::Sha224, SignatureFormat::Ieee1363, MSG)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = verify(
        key.public_key(),
        DigestScheme::Sha224,
        SignatureFormat::Ieee1363,
        MSG,
        &[0; 96],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn public_key_cannot_sign() {
    let mut rng = ChaCha20Rng::seed_from_u64(4);
    let public = EcKey::from(key(NamedCurve::Secp256r1).public_key().clone());

    let err = sign(&public, &mut rng, DigestScheme::Sha256, SignatureFormat::Ieee1363, MSG)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn scheme_names() {
    let scheme = DigestScheme::from_name("EMSA1(SHA-384)").unwrap();
    assert_eq!(scheme, DigestScheme::Sha384);
    assert_eq!(DigestScheme::from_ecdsa_oid(&scheme.ecdsa_oid()), Some(scheme));
    assert_eq!(
        DigestScheme::from_name("SHA-1").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}
