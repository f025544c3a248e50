//! Elliptic Curve Digital Signature Algorithm (ECDSA) over runtime domain
//! parameters.
//!
//! Messages are hashed by the caller; these functions take the digest
//! ("prehash") and truncate it to the bit length of the group order.

use crate::{
    DomainParameters, EcPrivateKey, EcPublicKey, Error, Result,
    field::{SecretModulus, to_fixed_bytes},
    secret_key::random_scalar,
};
use der::{Decode, Encode, Sequence, asn1::Uint};
use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

/// Nonces drawn before giving up on producing a signature.
const MAX_SIGNING_ATTEMPTS: usize = 16;

/// ECDSA signature `(r, s)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    r: BigUint,
    s: BigUint,
}

impl Signature {
    /// Signature from its two scalars. No range check is made here;
    /// verification rejects out-of-range values.
    pub fn from_scalars(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }

    /// The `r` component.
    pub fn r(&self) -> &BigUint {
        &self.r
    }

    /// The `s` component.
    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// IEEE 1363 encoding: `r || s`, each left padded to the byte length of
    /// the group order.
    pub fn to_bytes(&self, domain: &DomainParameters) -> Vec<u8> {
        let len = domain.order_bytes();
        let mut out = to_fixed_bytes(&self.r, len);
        out.extend_from_slice(&to_fixed_bytes(&self.s, len));
        out
    }

    /// Decode an IEEE 1363 `r || s` signature.
    pub fn from_bytes(domain: &DomainParameters, bytes: &[u8]) -> Result<Self> {
        let len = domain.order_bytes();

        if bytes.len() != 2 * len {
            return Err(Error::decoding(format!(
                "ECDSA signature must be {} bytes, got {}",
                2 * len,
                bytes.len()
            )));
        }

        let (r, s) = bytes.split_at(len);
        Ok(Self::from_scalars(
            BigUint::from_bytes_be(r),
            BigUint::from_bytes_be(s),
        ))
    }

    /// DER encoding: `SEQUENCE { r INTEGER, s INTEGER }`.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let sig = DerSignature {
            r: Uint::new(&self.r.to_bytes_be())?,
            s: Uint::new(&self.s.to_bytes_be())?,
        };

        Ok(sig.to_der()?)
    }

    /// Decode a DER `SEQUENCE { r INTEGER, s INTEGER }`.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let sig = DerSignature::from_der(bytes)?;

        Ok(Self::from_scalars(
            BigUint::from_bytes_be(sig.r.as_bytes()),
            BigUint::from_bytes_be(sig.s.as_bytes()),
        ))
    }
}

#[derive(Sequence)]
struct DerSignature {
    r: Uint,
    s: Uint,
}

/// Sign a message digest with a random per-signature nonce.
///
/// The private scalar and the nonce only enter wiped Montgomery arithmetic
/// modulo the group order.
pub fn sign_prehash(
    key: &EcPrivateKey,
    rng: &mut impl CryptoRngCore,
    prehash: &[u8],
) -> Result<Signature> {
    let domain = key.domain();
    let n = domain.order();
    let len = domain.order_bytes();
    let modulus = SecretModulus::new(n)?;

    let d = modulus.element(key.scalar_bytes())?;
    let e = modulus.element(&to_fixed_bytes(&(bits2int(prehash, domain.order_bits()) % n), len))?;
    let n_minus_2 = modulus.integer(&to_fixed_bytes(&(n - 2u32), len))?;

    for _ in 0..MAX_SIGNING_ATTEMPTS {
        let k = random_scalar(n, rng)?;
        let kg = domain.generator().mul_secret(&k);

        let r = match kg.x() {
            Some(x) => x % n,
            None => continue,
        };

        if r.is_zero() {
            continue;
        }

        // s = k⁻¹ · (e + r·d)
        let r_m = modulus.element(&to_fixed_bytes(&r, len))?;
        let k_inv = Zeroizing::new(modulus.element(&k)?.pow(&n_minus_2));
        let rd = Zeroizing::new(&*r_m * &*d);
        let sum = Zeroizing::new(&*e + &*rd);
        let s = BigUint::from_bytes_be(&modulus.to_bytes(&(&*k_inv * &*sum)));

        if s.is_zero() {
            continue;
        }

        return Ok(Signature { r, s });
    }

    Err(Error::Internal("ECDSA signing failed to find a nonce".into()))
}

/// Verify a signature over a message digest.
pub fn verify_prehash(key: &EcPublicKey, prehash: &[u8], signature: &Signature) -> bool {
    let domain = key.domain();
    let n = domain.order();
    let (r, s) = (&signature.r, &signature.s);

    if r.is_zero() || s.is_zero() || r >= n || s >= n {
        return false;
    }

    let e = bits2int(prehash, domain.order_bits()) % n;
    let w = invert_mod_order(s, n);
    let u1 = (&e * &w) % n;
    let u2 = (r * &w) % n;

    match domain.generator().mul2(&u1, key.point(), &u2) {
        Ok(point) => point.x().is_some_and(|x| (x % n) == *r),
        Err(_) => false,
    }
}

/// Leftmost `order_bits` bits of the digest as an integer.
fn bits2int(prehash: &[u8], order_bits: usize) -> BigUint {
    let e = BigUint::from_bytes_be(prehash);
    let digest_bits = prehash.len() * 8;

    if digest_bits > order_bits {
        e >> (digest_bits - order_bits)
    } else {
        e
    }
}

/// `a⁻¹ mod n` for prime `n`.
fn invert_mod_order(a: &BigUint, n: &BigUint) -> BigUint {
    a.modpow(&(n - 2u32), n)
}

#[cfg(test)]
mod tests {
    use super::bits2int;
    use num_bigint::BigUint;

    #[test]
    fn bits2int_truncates_long_digests() {
        let digest = [0xffu8; 32];
        assert_eq!(bits2int(&digest, 256), BigUint::from_bytes_be(&digest));
        assert_eq!(bits2int(&digest, 192), BigUint::from_bytes_be(&digest[..24]));
        assert_eq!(bits2int(&digest, 521), BigUint::from_bytes_be(&digest));
    }
}
