//! Ephemeral key exchange over the group a handshake negotiated.
//!
//! A [`GroupSelector`] routes to exactly one family: finite-field
//! Diffie-Hellman (named `ffdhe*` groups or explicit parameters), elliptic
//! curve Diffie-Hellman over a named curve, or X25519. The output is the raw
//! agreement value; key derivation happens elsewhere.

use crate::{
    Alert, Error, GroupSelector, NamedGroup, Result,
    dh::{DhGroup, DhPrivateKey, DhPublicKey},
    policy::{PeerKey, Policy},
};
use core::fmt;
use ecc_key::{EcPrivateKey, EcPublicKey, PointFormat, ecdh};
use num_bigint::BigUint;
use num_traits::One;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "x25519")]
use zeroize::Zeroizing;

/// Size of an X25519 public value.
#[cfg(feature = "x25519")]
const X25519_KEY_SIZE: usize = 32;

/// Our half of a key exchange.
pub enum EphemeralKey {
    /// Finite-field Diffie-Hellman.
    Dh(DhPrivateKey),
    /// Elliptic curve Diffie-Hellman.
    Ecdh(EcPrivateKey),
    /// X25519.
    #[cfg(feature = "x25519")]
    X25519(x25519_dalek::StaticSecret),
}

impl EphemeralKey {
    /// Public value to place on the wire: `Y` padded to the modulus length,
    /// an uncompressed SEC1 point, or the 32-byte X25519 u-coordinate.
    pub fn public_value(&self) -> Vec<u8> {
        match self {
            EphemeralKey::Dh(key) => key.public_value(),
            EphemeralKey::Ecdh(key) => key.public_key().to_sec1_bytes(PointFormat::Uncompressed),
            #[cfg(feature = "x25519")]
            EphemeralKey::X25519(secret) => {
                x25519_dalek::PublicKey::from(secret).as_bytes().to_vec()
            }
        }
    }
}

impl fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self {
            EphemeralKey::Dh(_) => "Dh",
            EphemeralKey::Ecdh(_) => "Ecdh",
            #[cfg(feature = "x25519")]
            EphemeralKey::X25519(_) => "X25519",
        };

        f.debug_tuple("EphemeralKey").field(&family).finish()
    }
}

impl From<DhPrivateKey> for EphemeralKey {
    fn from(key: DhPrivateKey) -> Self {
        EphemeralKey::Dh(key)
    }
}

impl From<EcPrivateKey> for EphemeralKey {
    fn from(key: EcPrivateKey) -> Self {
        EphemeralKey::Ecdh(key)
    }
}

/// Raw key agreement output, zeroized on drop.
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl ZeroizeOnDrop for SharedSecret {}

/// Generate our ephemeral key for `group`.
///
/// A selector that names no implemented group fails with a `decode_error`
/// alert.
pub fn generate_ephemeral_key(
    group: &GroupSelector,
    rng: &mut impl CryptoRngCore,
) -> Result<EphemeralKey> {
    if let Some(dh_group) = group.dh_group() {
        return Ok(EphemeralKey::Dh(DhPrivateKey::generate(dh_group, rng)?));
    }

    let named = group.named();

    if let Some(curve) = named.and_then(NamedGroup::curve) {
        tracing::debug!(%curve, "generating ECDH ephemeral key");
        return Ok(EphemeralKey::Ecdh(EcPrivateKey::generate(curve.domain()?, rng)?));
    }

    #[cfg(feature = "x25519")]
    if named == Some(NamedGroup::X25519) {
        let mut bytes = Zeroizing::new([0u8; X25519_KEY_SIZE]);
        rng.fill_bytes(bytes.as_mut_slice());

        tracing::debug!("generating X25519 ephemeral key");
        return Ok(EphemeralKey::X25519(x25519_dalek::StaticSecret::from(*bytes)));
    }

    Err(Error::tls(
        Alert::DecodeError,
        "cannot create a key offering without a group definition",
    ))
}

/// Agree on a shared secret with the peer's public value.
///
/// The peer value is decoded and checked for the group family, then handed
/// to `policy` before the raw agreement runs. None of the supported groups
/// draws from `rng` during agreement.
pub fn derive_shared_secret(
    group: &GroupSelector,
    own_key: &EphemeralKey,
    peer_public_value: &[u8],
    _rng: &mut impl CryptoRngCore,
    policy: &dyn Policy,
) -> Result<SharedSecret> {
    if let Some(dh_group) = group.dh_group() {
        check_allowed(group, policy)?;
        return derive_dh(dh_group, own_key, peer_public_value, policy);
    }

    let named = group.named();

    if let Some(named) = named.filter(|named| named.is_ecdh()) {
        check_allowed(group, policy)?;
        return derive_ecdh(named, own_key, peer_public_value, policy);
    }

    #[cfg(feature = "x25519")]
    if named == Some(NamedGroup::X25519) {
        check_allowed(group, policy)?;
        return derive_x25519(own_key, peer_public_value, policy);
    }

    Err(Error::tls(
        Alert::IllegalParameter,
        "did not recognize the key exchange group",
    ))
}

fn derive_ecdh(
    group: NamedGroup,
    own_key: &EphemeralKey,
    peer_public_value: &[u8],
    policy: &dyn Policy,
) -> Result<SharedSecret> {
    let (EphemeralKey::Ecdh(own), Some(curve)) = (own_key, group.curve()) else {
        return Err(mismatched_key(group));
    };

    let peer = EcPublicKey::from_sec1_bytes(curve.domain()?, peer_public_value)
        .map_err(|err| reject_peer_value(group, err))?;
    policy.check_peer_key_acceptable(&PeerKey::Ecdh(&peer))?;

    let shared = ecdh::diffie_hellman(own, &peer)?;
    Ok(SharedSecret::new(shared.raw_secret_bytes()))
}

fn derive_dh(
    dh_group: DhGroup,
    own_key: &EphemeralKey,
    peer_public_value: &[u8],
    policy: &dyn Policy,
) -> Result<SharedSecret> {
    let EphemeralKey::Dh(own) = own_key else {
        return Err(Error::InvalidArgument(
            "ephemeral key is not a DH key".into(),
        ));
    };

    // 1 < Y < p - 1 only; subgroup membership is not checked
    let y = BigUint::from_bytes_be(peer_public_value);
    let p_minus_1 = dh_group.p() - 1u32;

    if y <= BigUint::one() || y >= p_minus_1 {
        tracing::warn!(bits = dh_group.p_bits(), "rejected DH public value out of range");
        return Err(Error::tls(
            Alert::IllegalParameter,
            "peer sent bad DH key for DHE exchange",
        ));
    }

    let peer = DhPublicKey::new(dh_group, y);
    policy.check_peer_key_acceptable(&PeerKey::Dh(&peer))?;

    let shared = own.agree(&peer)?;
    Ok(SharedSecret::new(&shared))
}

#[cfg(feature = "x25519")]
fn derive_x25519(
    own_key: &EphemeralKey,
    peer_public_value: &[u8],
    policy: &dyn Policy,
) -> Result<SharedSecret> {
    let EphemeralKey::X25519(own) = own_key else {
        return Err(mismatched_key(NamedGroup::X25519));
    };

    let peer: [u8; X25519_KEY_SIZE] = peer_public_value.try_into().map_err(|_| {
        tracing::warn!(len = peer_public_value.len(), "rejected X25519 public value");
        Error::tls(Alert::HandshakeFailure, "Invalid X25519 key size")
    })?;

    policy.check_peer_key_acceptable(&PeerKey::X25519)?;

    let shared = own.diffie_hellman(&x25519_dalek::PublicKey::from(peer));

    if !shared.was_contributory() {
        tracing::warn!("rejected low order X25519 public value");
        return Err(Error::tls(
            Alert::IllegalParameter,
            "peer sent a low order X25519 public value",
        ));
    }

    Ok(SharedSecret::new(shared.as_bytes()))
}

fn check_allowed(group: &GroupSelector, policy: &dyn Policy) -> Result<()> {
    match group.named() {
        Some(named) if !policy.allowed_group(named) => Err(Error::tls(
            Alert::HandshakeFailure,
            format!("key exchange group {named} is not allowed by policy"),
        )),
        _ => Ok(()),
    }
}

fn mismatched_key(group: NamedGroup) -> Error {
    Error::InvalidArgument(format!("ephemeral key does not belong to group {group}"))
}

fn reject_peer_value(group: NamedGroup, err: ecc_key::Error) -> Error {
    tracing::warn!(%group, %err, "rejected ECDH public value");
    Error::from_peer_value(err)
}
