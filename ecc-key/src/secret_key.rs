//! Elliptic curve private keys: private scalars together with their public
//! point.

use crate::{
    AlgorithmIdentifier, DomainParameters, EcPublicKey, Error, PointFormat, Result,
    field::{to_fixed_bytes, to_fixed_bytes_secret},
    public_key::encoding_of,
};
use alloc::sync::Arc;
use core::fmt;
use der::{
    Decode, Encode, Sequence,
    asn1::{AnyRef, BitStringRef, OctetStringRef},
};
use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::CryptoRngCore;
use subtle::{Choice, ConstantTimeEq, ConstantTimeLess};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Attempts at drawing an in-range scalar before giving up on the RNG.
const MAX_SCALAR_ATTEMPTS: usize = 64;

/// Elliptic curve private key.
///
/// The scalar `d` always satisfies `1 <= d < n` and the public point is
/// `d · G`. The scalar is stored as fixed-width big endian bytes which are
/// zeroized on drop.
///
/// # ⚠️ Warning
///
/// This value is key material.
///
/// Please treat it with the care it deserves!
#[derive(Clone)]
pub struct EcPrivateKey {
    public: EcPublicKey,
    scalar: Vec<u8>,
}

impl EcPrivateKey {
    /// Generate a fresh key with a scalar drawn uniformly from `[1, n - 1]`.
    ///
    /// A generated key which fails its own public point check is reported as
    /// [`Error::Internal`].
    pub fn generate(domain: Arc<DomainParameters>, rng: &mut impl CryptoRngCore) -> Result<Self> {
        let scalar = random_scalar(domain.order(), rng)?;
        let key = Self::derive(domain, &scalar);

        if let Err(err) = key.public.point().check_invariants() {
            tracing::error!(%err, "freshly generated EC key failed validation");
            return Err(Error::Internal(
                "generated EC key failed its own validity check".into(),
            ));
        }

        tracing::debug!(
            bits = key.public.key_length(),
            "generated EC private key"
        );
        Ok(key)
    }

    /// Derive the key pair for a known scalar.
    ///
    /// A scalar outside `[1, n - 1]` is an [`Error::InvalidArgument`].
    pub fn from_private_scalar(domain: Arc<DomainParameters>, scalar: &BigUint) -> Result<Self> {
        if scalar.is_zero() || scalar >= domain.order() {
            return Err(Error::invalid_argument("private scalar is out of range"));
        }

        let scalar = to_fixed_bytes_secret(scalar, domain.order_bytes());
        Ok(Self::derive(domain, &scalar))
    }

    /// `scalar` is fixed-width big endian and already range checked.
    fn derive(domain: Arc<DomainParameters>, scalar: &[u8]) -> Self {
        let point = domain.generator().mul_secret(scalar);

        Self {
            public: EcPublicKey::new_unchecked(domain, point),
            scalar: scalar.to_vec(),
        }
    }

    /// Decode the `ECPrivateKey` container produced by
    /// [`EcPrivateKey::to_pkcs8_bytes`], with domain parameters taken from
    /// `alg_id`.
    ///
    /// Only version 1 containers are accepted. When the container carries a
    /// public key it must match the recomputed one.
    pub fn from_encoded(alg_id: &AlgorithmIdentifier, key_bytes: &[u8]) -> Result<Self> {
        Self::from_encoded_with_implicit(alg_id, key_bytes, None)
    }

    /// Like [`EcPrivateKey::from_encoded`], resolving `implicitCA` parameters
    /// to `implicit`.
    pub fn from_encoded_with_implicit(
        alg_id: &AlgorithmIdentifier,
        key_bytes: &[u8],
        implicit: Option<&Arc<DomainParameters>>,
    ) -> Result<Self> {
        let domain = DomainParameters::from_algorithm_identifier(alg_id, implicit)?;
        let container = PrivateKeyContainer::from_der(key_bytes)?;

        if container.version != 1 {
            return Err(Error::decoding(format!(
                "unknown version {} for ECC private key",
                container.version
            )));
        }

        let scalar = fixed_width_scalar(container.private_key.as_bytes(), domain.order_bytes())
            .ok_or_else(|| Error::decoding("ECC private key scalar is too long"))?;

        if !scalar_in_range(&scalar, &to_fixed_bytes(domain.order(), domain.order_bytes())) {
            return Err(Error::decoding("ECC private key scalar is out of range"));
        }

        let mut key = Self::derive(domain, &scalar);

        if key.public.point().check_invariants().is_err() {
            return Err(Error::invalid_point(
                "ECC private key does not produce a valid public point",
            ));
        }

        if let Some(public) = &container.public_key {
            let stored = public
                .as_bytes()
                .ok_or_else(|| Error::decoding("ECC public key bit string is not octet aligned"))?;
            let recomputed = key.public.to_sec1_bytes(point_format_of(stored));

            if !bool::from(stored.ct_eq(&recomputed)) {
                return Err(Error::invalid_point(
                    "stored public key does not match the private scalar",
                ));
            }
        }

        key.public.set_parameter_encoding(encoding_of(alg_id))?;
        Ok(key)
    }

    /// Serialize as `SEQUENCE { INTEGER 1, OCTET STRING d }` with `d` in its
    /// natural big endian length, without leading zero bytes.
    pub fn to_pkcs8_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let container = PrivateKeyContainer {
            version: 1,
            private_key: OctetStringRef::new(self.natural_scalar())?,
            parameters: None,
            public_key: None,
        };

        Ok(Zeroizing::new(container.to_der()?))
    }

    /// The private scalar `d`, big endian without leading zero bytes.
    pub fn private_value(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.natural_scalar().to_vec())
    }

    /// Fixed-width big endian encoding of the private scalar.
    pub fn scalar_bytes(&self) -> &[u8] {
        &self.scalar
    }

    fn natural_scalar(&self) -> &[u8] {
        // d >= 1, so at least one byte is non-zero
        let start = self.scalar.iter().position(|&b| b != 0).unwrap_or(0);
        &self.scalar[start..]
    }

    /// Public half of this key pair.
    pub fn public_key(&self) -> &EcPublicKey {
        &self.public
    }

    /// Domain parameters.
    pub fn domain(&self) -> &Arc<DomainParameters> {
        self.public.domain()
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Drop for EcPrivateKey {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl ZeroizeOnDrop for EcPrivateKey {}

/// `ECPrivateKey` from RFC 5915.
#[derive(Sequence)]
struct PrivateKeyContainer<'a> {
    version: u8,
    private_key: OctetStringRef<'a>,
    #[asn1(context_specific = "0", optional = "true")]
    parameters: Option<AnyRef<'a>>,
    #[asn1(context_specific = "1", optional = "true")]
    public_key: Option<BitStringRef<'a>>,
}

fn point_format_of(encoded: &[u8]) -> PointFormat {
    match encoded.first() {
        Some(0x02 | 0x03) => PointFormat::Compressed,
        Some(0x06 | 0x07) => PointFormat::Hybrid,
        _ => PointFormat::Uncompressed,
    }
}

/// Left pad (or strip leading zeros from) a big endian scalar to `len`
/// bytes. `None` when it does not fit.
fn fixed_width_scalar(bytes: &[u8], len: usize) -> Option<Zeroizing<Vec<u8>>> {
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len());
    let significant = &bytes[start..];

    if significant.len() > len {
        return None;
    }

    let mut out = Zeroizing::new(vec![0u8; len]);
    out[len - significant.len()..].copy_from_slice(significant);
    Some(out)
}

/// Constant-time `0 < scalar < order` for equal-width big endian values.
fn scalar_in_range(scalar: &[u8], order: &[u8]) -> bool {
    debug_assert_eq!(scalar.len(), order.len());

    let mut less = Choice::from(0);
    let mut equal = Choice::from(1);
    let mut nonzero = Choice::from(0);

    for (s, n) in scalar.iter().zip(order) {
        less |= equal & s.ct_lt(n);
        equal &= s.ct_eq(n);
        nonzero |= !s.ct_eq(&0);
    }

    (less & nonzero).into()
}

/// Draw a fixed-width big endian scalar uniformly from `[1, order - 1]` by
/// rejection sampling.
pub(crate) fn random_scalar(
    order: &BigUint,
    rng: &mut impl CryptoRngCore,
) -> Result<Zeroizing<Vec<u8>>> {
    let bits = order.bits() as usize;
    let len = bits.div_ceil(8);
    let excess = len * 8 - bits;
    let order = to_fixed_bytes(order, len);
    let mut buf = Zeroizing::new(vec![0u8; len]);

    for _ in 0..MAX_SCALAR_ATTEMPTS {
        rng.fill_bytes(buf.as_mut_slice());
        buf[0] &= 0xff >> excess;

        if scalar_in_range(&buf, &order) {
            return Ok(buf);
        }
    }

    Err(Error::Internal(
        "random source failed to produce an in-range scalar".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{fixed_width_scalar, scalar_in_range};

    #[test]
    fn range_check() {
        let order = [0x01, 0x00];
        assert!(scalar_in_range(&[0x00, 0x01], &order));
        assert!(scalar_in_range(&[0x00, 0xff], &order));
        assert!(!scalar_in_range(&[0x00, 0x00], &order));
        assert!(!scalar_in_range(&[0x01, 0x00], &order));
        assert!(!scalar_in_range(&[0x01, 0x01], &order));
    }

    #[test]
    fn scalar_width() {
        assert_eq!(fixed_width_scalar(&[7], 3).unwrap().as_slice(), [0, 0, 7]);
        assert_eq!(fixed_width_scalar(&[0, 0, 0, 7], 2).unwrap().as_slice(), [0, 7]);
        assert!(fixed_width_scalar(&[1, 0, 0], 2).is_none());
    }
}
