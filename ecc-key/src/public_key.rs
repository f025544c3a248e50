//! Elliptic curve public keys.

use crate::{
    AlgorithmIdentifier, DomainParameters, EncodingMode, Error, Result,
    point::{EcPoint, PointFormat},
};
use alloc::sync::Arc;
use der::{Tag, Tagged};
use num_traits::One;

/// Elliptic curve public key: a validated point on a shared set of domain
/// parameters.
///
/// Every constructor checks that the point is on the curve, is not the
/// identity and, for curves with a cofactor, lies in the prime order
/// subgroup.
#[derive(Clone, Debug)]
pub struct EcPublicKey {
    domain: Arc<DomainParameters>,
    point: EcPoint,
    encoding: EncodingMode,
}

impl EcPublicKey {
    /// Wrap `point` as a public key on `domain`.
    ///
    /// A point on a different curve is an [`Error::InvalidArgument`]; a point
    /// on the right curve which fails validation is an
    /// [`Error::InvalidPoint`].
    pub fn from_point(domain: Arc<DomainParameters>, point: EcPoint) -> Result<Self> {
        if point.curve() != domain.curve() {
            return Err(Error::invalid_argument(
                "curve mismatch between domain parameters and point",
            ));
        }

        Self::checked(domain, point)
    }

    /// Decode a public key from its algorithm identifier and the SEC1 point
    /// octets carried in the subject public key.
    pub fn from_encoded(alg_id: &AlgorithmIdentifier, key_bytes: &[u8]) -> Result<Self> {
        Self::from_encoded_with_implicit(alg_id, key_bytes, None)
    }

    /// Like [`EcPublicKey::from_encoded`], resolving `implicitCA` parameters
    /// to `implicit`.
    pub fn from_encoded_with_implicit(
        alg_id: &AlgorithmIdentifier,
        key_bytes: &[u8],
        implicit: Option<&Arc<DomainParameters>>,
    ) -> Result<Self> {
        let domain = DomainParameters::from_algorithm_identifier(alg_id, implicit)?;
        let mut key = Self::from_sec1_bytes(domain, key_bytes)?;
        key.encoding = encoding_of(alg_id);
        Ok(key)
    }

    /// Decode a SEC1 encoded point on `domain`.
    pub fn from_sec1_bytes(domain: Arc<DomainParameters>, bytes: &[u8]) -> Result<Self> {
        let point = EcPoint::decode(domain.curve(), bytes)?;
        Self::checked(domain, point)
    }

    fn checked(domain: Arc<DomainParameters>, point: EcPoint) -> Result<Self> {
        point.check_invariants()?;

        if !domain.cofactor().is_one() && !point.mul(domain.order()).is_identity() {
            return Err(Error::invalid_point(
                "point is not in the prime order subgroup",
            ));
        }

        Ok(Self::new_unchecked(domain, point))
    }

    /// Build from a point known to be `d · G` for an in-range scalar `d`.
    pub(crate) fn new_unchecked(domain: Arc<DomainParameters>, point: EcPoint) -> Self {
        let encoding = if domain.oid().is_some() {
            EncodingMode::NamedCurveOid
        } else {
            EncodingMode::Explicit
        };

        Self {
            domain,
            point,
            encoding,
        }
    }

    /// Domain parameters.
    pub fn domain(&self) -> &Arc<DomainParameters> {
        &self.domain
    }

    /// Public point.
    pub fn point(&self) -> &EcPoint {
        &self.point
    }

    /// Encoding used for the domain parameters in
    /// [`EcPublicKey::algorithm_identifier`].
    pub fn parameter_encoding(&self) -> EncodingMode {
        self.encoding
    }

    /// Choose how [`EcPublicKey::algorithm_identifier`] writes the domain
    /// parameters.
    ///
    /// [`EncodingMode::NamedCurveOid`] is rejected when the curve has no
    /// object identifier.
    pub fn set_parameter_encoding(&mut self, mode: EncodingMode) -> Result<()> {
        if mode == EncodingMode::NamedCurveOid && self.domain.oid().is_none() {
            return Err(Error::invalid_argument(
                "invalid encoding form for EC key: curve has no object identifier",
            ));
        }

        self.encoding = mode;
        Ok(())
    }

    /// `AlgorithmIdentifier` carrying the domain parameters.
    pub fn algorithm_identifier(&self) -> Result<AlgorithmIdentifier> {
        self.domain.algorithm_identifier(self.encoding)
    }

    /// Subject public key bytes: the compressed SEC1 point.
    pub fn x509_public_bytes(&self) -> Vec<u8> {
        self.point.encode(PointFormat::Compressed)
    }

    /// SEC1 encoding of the point in the given format.
    pub fn to_sec1_bytes(&self, format: PointFormat) -> Vec<u8> {
        self.point.encode(format)
    }

    /// Bit length of the field modulus.
    pub fn key_length(&self) -> usize {
        self.domain.field_bits()
    }

    /// Approximate security level in bits.
    pub fn estimated_strength(&self) -> usize {
        self.domain.estimated_strength()
    }
}

impl PartialEq for EcPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.domain.is_equivalent(&other.domain) && self.point == other.point
    }
}

impl Eq for EcPublicKey {}

pub(crate) fn encoding_of(alg_id: &AlgorithmIdentifier) -> EncodingMode {
    match alg_id.parameters.as_ref().map(Tagged::tag) {
        Some(Tag::ObjectIdentifier) => EncodingMode::NamedCurveOid,
        Some(Tag::Null) => EncodingMode::ImplicitTrusted,
        _ => EncodingMode::Explicit,
    }
}
