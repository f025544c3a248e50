#![no_main]
use ecc_key::{
    AlgorithmIdentifier, DomainParameters, EcPublicKey, EncodingMode, NamedCurve,
    der::{Decode, Encode},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let implicit = NamedCurve::Secp256r1.domain().unwrap();

    if let Ok(domain) = DomainParameters::from_der_with_implicit(data, Some(&implicit)) {
        // Anything accepted must survive an explicit round trip
        let explicit = domain.to_der(EncodingMode::Explicit).unwrap();
        let again = DomainParameters::from_der(&explicit).unwrap();
        assert!(again.is_equivalent(&domain));
    }

    if let Ok(alg_id) = AlgorithmIdentifier::from_der(data) {
        let _ = alg_id.to_der();

        if let Some(split) = data.len().checked_sub(65) {
            let _ = EcPublicKey::from_encoded_with_implicit(
                &alg_id,
                &data[split..],
                Some(&implicit),
            );
        }
    }
});
