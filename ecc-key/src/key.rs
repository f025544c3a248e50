//! Either half of an EC key pair.

use crate::{EcPrivateKey, EcPublicKey, Error, Result};
use zeroize::Zeroizing;

/// An elliptic curve key which may or may not carry its private scalar.
#[derive(Clone, Debug)]
pub enum EcKey {
    /// Public point only.
    Public(EcPublicKey),
    /// Private scalar and public point.
    Private(EcPrivateKey),
}

impl EcKey {
    /// Public half of the key.
    pub fn public_key(&self) -> &EcPublicKey {
        match self {
            EcKey::Public(public) => public,
            EcKey::Private(private) => private.public_key(),
        }
    }

    /// Private half of the key.
    ///
    /// Fails with [`Error::InvalidState`] when the key was built without one.
    pub fn private_key(&self) -> Result<&EcPrivateKey> {
        match self {
            EcKey::Private(private) => Ok(private),
            EcKey::Public(_) => Err(Error::InvalidState(
                "EC key has no private component (uninitialized state)".into(),
            )),
        }
    }

    /// The private scalar as big endian bytes, see
    /// [`EcPrivateKey::private_value`].
    ///
    /// Fails with [`Error::InvalidState`] when the key was built without one.
    pub fn private_value(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.private_key().map(EcPrivateKey::private_value)
    }

    /// Does this key carry a private scalar?
    pub fn has_private_key(&self) -> bool {
        matches!(self, EcKey::Private(_))
    }
}

impl From<EcPublicKey> for EcKey {
    fn from(public: EcPublicKey) -> EcKey {
        EcKey::Public(public)
    }
}

impl From<EcPrivateKey> for EcKey {
    fn from(private: EcPrivateKey) -> EcKey {
        EcKey::Private(private)
    }
}
