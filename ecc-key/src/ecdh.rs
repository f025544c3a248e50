//! Elliptic Curve Diffie-Hellman key agreement.
//!
//! The shared secret is the raw x-coordinate of `d · Q`, left padded to the
//! byte length of the field. No key derivation is applied.

use crate::{
    EcPrivateKey, EcPublicKey, Error, Result,
    field::{to_fixed_bytes_secret, wipe},
};
use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Shared secret value computed via ECDH key agreement.
pub struct SharedSecret {
    secret_bytes: Vec<u8>,
}

impl SharedSecret {
    /// Shared secret value, not suitable as a symmetric key as-is.
    pub fn raw_secret_bytes(&self) -> &[u8] {
        &self.secret_bytes
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.secret_bytes.zeroize();
    }
}

impl ZeroizeOnDrop for SharedSecret {}

/// Compute the ECDH shared secret between `secret` and `public`.
///
/// Both keys must be on equivalent domain parameters. The affine
/// coordinates of `d · Q` are wiped once the secret is encoded.
pub fn diffie_hellman(secret: &EcPrivateKey, public: &EcPublicKey) -> Result<SharedSecret> {
    if !secret.domain().is_equivalent(public.domain()) {
        return Err(Error::invalid_argument(
            "ECDH keys are on different domain parameters",
        ));
    }

    let (mut x, mut y) = public
        .point()
        .mul_secret(secret.scalar_bytes())
        .into_coordinates()
        .ok_or_else(|| Error::invalid_point("ECDH produced the point at infinity"))?;

    let secret_bytes = to_fixed_bytes_secret(&x, secret.domain().field_bytes());
    wipe(&mut x);
    wipe(&mut y);

    Ok(SharedSecret {
        secret_bytes: secret_bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::diffie_hellman;
    use crate::{EcPrivateKey, NamedCurve};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn both_sides_agree() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let domain = NamedCurve::Secp256k1.domain().unwrap();
        let alice = EcPrivateKey::generate(domain.clone(), &mut rng).unwrap();
        let bob = EcPrivateKey::generate(domain, &mut rng).unwrap();

        let forward = diffie_hellman(&alice, bob.public_key()).unwrap();
        let reverse = diffie_hellman(&bob, alice.public_key()).unwrap();

        assert_eq!(forward.raw_secret_bytes(), reverse.raw_secret_bytes());
        assert_eq!(forward.raw_secret_bytes().len(), 32);
    }

    #[test]
    fn rejects_mismatched_curves() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let alice =
            EcPrivateKey::generate(NamedCurve::Secp256r1.domain().unwrap(), &mut rng).unwrap();
        let bob =
            EcPrivateKey::generate(NamedCurve::Secp384r1.domain().unwrap(), &mut rng).unwrap();

        assert!(diffie_hellman(&alice, bob.public_key()).is_err());
    }
}
