//! Policy file loading tests.

use std::io::Write;
use tls_trust::{
    Alert, DhGroup, Error, NamedGroup, PeerKey, Policy, PolicyConfig,
    ecc_key::{EcPrivateKey, NamedCurve},
};

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
require_revocation_info = true
minimum_signature_strength = 128
minimum_dh_group_size = 3072
allowed_groups = ["x25519", "secp384r1", "ffdhe3072"]
"#
    )
    .unwrap();

    let config = PolicyConfig::load(file.path()).unwrap();

    assert!(config.require_cert_revocation_info());
    assert_eq!(config.minimum_signature_strength(), 128);
    assert_eq!(config.minimum_dh_group_size(), 3072);
    assert_eq!(config.minimum_ecdh_group_size(), 255);
    assert!(config.allowed_group(NamedGroup::Secp384r1));
    assert!(!config.allowed_group(NamedGroup::Secp256r1));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = PolicyConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "minimum_dh_group_size = \"large\"").unwrap();

    assert!(matches!(PolicyConfig::load(file.path()), Err(Error::Config(_))));
}

#[test]
fn peer_key_sizes() {
    let config = PolicyConfig::from_toml_str("minimum_dh_group_size = 3072").unwrap();

    let dh = DhGroup::ffdhe2048();
    let public = tls_trust::DhPublicKey::new(dh.clone(), dh.g().clone());
    let err = config
        .check_peer_key_acceptable(&PeerKey::Dh(&public))
        .unwrap_err();
    assert_eq!(err.alert(), Some(Alert::InsufficientSecurity));

    let public = tls_trust::DhPublicKey::new(DhGroup::ffdhe3072(), dh.g().clone());
    config.check_peer_key_acceptable(&PeerKey::Dh(&public)).unwrap();

    config.check_peer_key_acceptable(&PeerKey::X25519).unwrap();

    let mut rng = rand_core::OsRng;
    let p256 = EcPrivateKey::generate(NamedCurve::Secp256r1.domain().unwrap(), &mut rng).unwrap();
    config
        .check_peer_key_acceptable(&PeerKey::Ecdh(p256.public_key()))
        .unwrap();
    config
        .check_peer_key_acceptable(&PeerKey::Ecdsa(p256.public_key()))
        .unwrap();

    let strict = PolicyConfig::from_toml_str("minimum_ecdh_group_size = 256").unwrap();
    assert!(strict.check_peer_key_acceptable(&PeerKey::X25519).is_err());
}
