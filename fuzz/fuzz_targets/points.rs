#![no_main]
// Targets: secp256r1, secp384r1, secp521r1, secp256k1, brainpoolP256r1
use ecc_key::{EcPoint, EcPublicKey, NamedCurve, PointFormat, num_bigint::BigUint};
use libfuzzer_sys::fuzz_target;
use rand_chacha::{ChaChaRng, rand_core::{RngCore, SeedableRng}};

const CURVES: [NamedCurve; 5] = [
    NamedCurve::Secp256r1,
    NamedCurve::Secp384r1,
    NamedCurve::Secp521r1,
    NamedCurve::Secp256k1,
    NamedCurve::BrainpoolP256r1,
];

fuzz_target!(|data: &[u8]| {
    if data.len() < 33 {
        return;
    }

    let curve = CURVES[usize::from(data[0]) % CURVES.len()];
    let domain = curve.domain().unwrap();
    let mut rng = ChaChaRng::from_seed(data[1..33].try_into().unwrap());
    let encoded = &data[33..];

    let Ok(point) = EcPoint::decode(domain.curve(), encoded) else {
        return;
    };

    // Decoding accepts exactly the points it can re-encode
    for format in [
        PointFormat::Compressed,
        PointFormat::Uncompressed,
        PointFormat::Hybrid,
    ] {
        let again = EcPoint::decode(domain.curve(), &point.encode(format)).unwrap();
        assert!(again == point);
    }

    let Ok(key) = EcPublicKey::from_sec1_bytes(domain.clone(), encoded) else {
        return;
    };

    // Test scalar multiplication distributive property
    let mut k = [0u8; 8];
    rng.fill_bytes(&mut k);
    let k = BigUint::from_bytes_be(&k);
    let sum = key.point().add(key.point()).unwrap();
    assert!(sum.mul(&k) == key.point().mul(&(&k + &k)));
});
