//! Elliptic curve domain parameters and their ASN.1 encodings.
//!
//! Parameters travel inside an `AlgorithmIdentifier` as the `ECParameters`
//! choice from RFC 3279 / SEC1:
//!
//! ```text
//! ECParameters ::= CHOICE {
//!   ecParameters  SpecifiedECDomain,   -- explicit
//!   namedCurve    OBJECT IDENTIFIER,
//!   implicitCA    NULL }
//! ```

use crate::{
    Error, Result,
    field::{is_probable_prime, to_fixed_bytes},
    named::NamedCurve,
    point::{Curve, EcPoint, PointFormat},
    registry,
};
use alloc::sync::Arc;
use der::{
    Decode, Encode, Sequence, Tag, Tagged,
    asn1::{Any, BitString, Null, ObjectIdentifier, OctetString, Uint},
};
use num_bigint::BigUint;
use num_integer::Integer;

/// Largest field modulus accepted from explicit parameters.
const MAX_EXPLICIT_FIELD_BITS: u64 = 1024;

/// How domain parameters are written into an algorithm identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EncodingMode {
    /// Full `SpecifiedECDomain` structure.
    Explicit,
    /// Curve object identifier. Only available for recognized curves.
    NamedCurveOid,
    /// `NULL`: the peer is expected to already know the parameters.
    ImplicitTrusted,
}

/// Immutable description of an elliptic curve group: the curve, a base point
/// `G`, its prime order `n` and the cofactor `h`.
///
/// Always handled through an [`Arc`] so that every key built on the same
/// curve shares one instance.
#[derive(Clone, Debug)]
pub struct DomainParameters {
    curve: Arc<Curve>,
    generator: EcPoint,
    order: BigUint,
    cofactor: BigUint,
    oid: Option<ObjectIdentifier>,
}

impl DomainParameters {
    /// Build and validate domain parameters.
    ///
    /// The generator must lie on `curve`, `order` must be an odd prime with
    /// `order · G = O`, the cofactor must be odd, and `h · n` must respect
    /// the Hasse bound.
    pub fn new(
        curve: Arc<Curve>,
        generator: EcPoint,
        order: BigUint,
        cofactor: BigUint,
    ) -> Result<Self> {
        Self::validate(&curve, &generator, &order, &cofactor)?;

        Ok(Self {
            curve,
            generator,
            order,
            cofactor,
            oid: None,
        })
    }

    /// Build domain parameters from raw integers.
    pub fn from_components(
        p: BigUint,
        a: BigUint,
        b: BigUint,
        (gx, gy): (BigUint, BigUint),
        order: BigUint,
        cofactor: BigUint,
        oid: Option<ObjectIdentifier>,
    ) -> Result<Self> {
        let curve = Arc::new(Curve::new(p, a, b)?);
        let generator = EcPoint::new(curve.clone(), gx, gy);
        let mut params = Self::new(curve, generator, order, cofactor)?;
        params.oid = oid;
        Ok(params)
    }

    /// Look up a well-known curve through the identifier registry.
    pub fn from_name(name: &str) -> Result<Arc<Self>> {
        Self::from_oid(&registry::str2oid(name)?)
    }

    /// Look up a well-known curve by OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Arc<Self>> {
        NamedCurve::from_oid(oid)
            .ok_or_else(|| Error::UnknownIdentifier(format!("unknown ECC group OID {oid}")))?
            .domain()
    }

    fn validate(
        curve: &Arc<Curve>,
        generator: &EcPoint,
        order: &BigUint,
        cofactor: &BigUint,
    ) -> Result<()> {
        if generator.curve() != curve {
            return Err(Error::invalid_argument("base point is on a different curve"));
        }

        if generator.check_invariants().is_err() {
            return Err(Error::invalid_argument("base point is not on the curve"));
        }

        if order.bits() < 2 || order.is_even() || cofactor.is_even() {
            return Err(Error::invalid_argument(
                "group order and cofactor must be odd",
            ));
        }

        if !is_probable_prime(curve.p()) {
            return Err(Error::invalid_argument("field modulus is not prime"));
        }

        if !is_probable_prime(order) {
            return Err(Error::invalid_argument("group order is not prime"));
        }

        // (h·n - (p + 1))² <= 4p
        let group_size = cofactor * order;
        let p_plus_1 = curve.p() + 1u32;
        let trace = if group_size >= p_plus_1 {
            &group_size - &p_plus_1
        } else {
            &p_plus_1 - &group_size
        };

        if &trace * &trace > curve.p() * 4u32 {
            return Err(Error::invalid_argument(
                "group order and cofactor violate the Hasse bound",
            ));
        }

        if !generator.mul(order).is_identity() {
            return Err(Error::invalid_argument(
                "base point does not have the stated order",
            ));
        }

        Ok(())
    }

    /// The curve equation.
    pub fn curve(&self) -> &Arc<Curve> {
        &self.curve
    }

    /// Base point `G`.
    pub fn generator(&self) -> &EcPoint {
        &self.generator
    }

    /// Order `n` of the base point.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    /// Cofactor `h`.
    pub fn cofactor(&self) -> &BigUint {
        &self.cofactor
    }

    /// Curve OID, present for recognized curves.
    pub fn oid(&self) -> Option<&ObjectIdentifier> {
        self.oid.as_ref()
    }

    /// Registered name of the curve, if it has one.
    pub fn name(&self) -> Option<String> {
        self.oid.as_ref().and_then(|oid| registry::oid2str(oid).ok())
    }

    /// Bit length of the field modulus.
    pub fn field_bits(&self) -> usize {
        self.curve.field().bits() as usize
    }

    /// Length of a serialized field element.
    pub fn field_bytes(&self) -> usize {
        self.curve.field().byte_len()
    }

    /// Bit length of the group order.
    pub fn order_bits(&self) -> usize {
        self.order.bits() as usize
    }

    /// Length of a serialized scalar.
    pub fn order_bytes(&self) -> usize {
        self.order_bits().div_ceil(8)
    }

    /// Approximate security level in bits.
    pub fn estimated_strength(&self) -> usize {
        self.field_bits() / 2
    }

    /// Do both parameter sets describe the same group?
    ///
    /// OIDs are not compared: explicit and named encodings of one curve are
    /// equivalent.
    pub fn is_equivalent(&self, other: &DomainParameters) -> bool {
        self.curve == other.curve
            && self.generator == other.generator
            && self.order == other.order
            && self.cofactor == other.cofactor
    }

    /// Encode as `ECParameters` DER.
    pub fn to_der(&self, mode: EncodingMode) -> Result<Vec<u8>> {
        let der = match mode {
            EncodingMode::Explicit => self.to_specified()?.to_der()?,
            EncodingMode::NamedCurveOid => self
                .oid
                .ok_or_else(|| Error::invalid_argument("curve has no object identifier"))?
                .to_der()?,
            EncodingMode::ImplicitTrusted => Null.to_der()?,
        };

        Ok(der)
    }

    /// Decode `ECParameters` DER. `implicitCA` is rejected.
    pub fn from_der(bytes: &[u8]) -> Result<Arc<Self>> {
        Self::from_der_with_implicit(bytes, None)
    }

    /// Decode `ECParameters` DER, resolving `implicitCA` to `implicit`.
    pub fn from_der_with_implicit(
        bytes: &[u8],
        implicit: Option<&Arc<DomainParameters>>,
    ) -> Result<Arc<Self>> {
        Self::from_any(&Any::from_der(bytes)?, implicit)
    }

    fn from_any(params: &Any, implicit: Option<&Arc<DomainParameters>>) -> Result<Arc<Self>> {
        match params.tag() {
            Tag::ObjectIdentifier => Self::from_oid(&params.decode_as::<ObjectIdentifier>()?),
            Tag::Null => {
                params.decode_as::<Null>()?;
                implicit
                    .cloned()
                    .ok_or_else(|| Error::decoding("implicitCA domain parameters are not available"))
            }
            Tag::Sequence => Self::from_specified(&params.decode_as::<SpecifiedDomain>()?),
            tag => Err(Error::decoding(format!(
                "unexpected ECParameters tag {tag}"
            ))),
        }
    }

    fn to_specified(&self) -> Result<SpecifiedDomain> {
        let field_len = self.field_bytes();

        Ok(SpecifiedDomain {
            version: 1,
            field_id: FieldId {
                field_type: registry::PRIME_FIELD,
                prime: uint(self.curve.p())?,
            },
            curve: CurveCoefficients {
                a: OctetString::new(to_fixed_bytes(self.curve.a(), field_len))?,
                b: OctetString::new(to_fixed_bytes(self.curve.b(), field_len))?,
                seed: None,
            },
            base: OctetString::new(self.generator.encode(PointFormat::Uncompressed))?,
            order: uint(&self.order)?,
            cofactor: uint(&self.cofactor)?,
        })
    }

    fn from_specified(spec: &SpecifiedDomain) -> Result<Arc<Self>> {
        if spec.version != 1 {
            return Err(Error::decoding(format!(
                "unknown ECC parameter version {}",
                spec.version
            )));
        }

        if spec.field_id.field_type != registry::PRIME_FIELD {
            return Err(Error::decoding(format!(
                "unsupported ECC field type {}",
                spec.field_id.field_type
            )));
        }

        let p = BigUint::from_bytes_be(spec.field_id.prime.as_bytes());
        let order = BigUint::from_bytes_be(spec.order.as_bytes());
        let cofactor = BigUint::from_bytes_be(spec.cofactor.as_bytes());

        if p.bits() > MAX_EXPLICIT_FIELD_BITS {
            return Err(Error::decoding(format!(
                "explicit field modulus of {} bits exceeds {MAX_EXPLICIT_FIELD_BITS} bits",
                p.bits()
            )));
        }

        // Hasse: n <= p + 1 + 2*sqrt(p)
        if order.bits() > p.bits() + 1 || cofactor.bits() > p.bits() + 1 {
            return Err(Error::decoding(format!(
                "explicit group order of {} bits is too large for a {}-bit field",
                order.bits().max(cofactor.bits()),
                p.bits()
            )));
        }

        let a = BigUint::from_bytes_be(spec.curve.a.as_bytes());
        let b = BigUint::from_bytes_be(spec.curve.b.as_bytes());

        let curve = Arc::new(
            Curve::new(p, a, b).map_err(|e| Error::decoding(format!("invalid curve: {e}")))?,
        );
        let generator = EcPoint::decode(&curve, spec.base.as_bytes())?;

        let params = Self::new(curve, generator, order, cofactor)
            .map_err(|e| Error::decoding(format!("invalid explicit ECC parameters: {e}")))?;

        Ok(params.recognize())
    }

    /// Swap in the shared built-in instance when these explicit parameters
    /// describe a well-known curve.
    fn recognize(self) -> Arc<Self> {
        for curve in NamedCurve::ALL {
            if curve.modulus().as_ref() != Some(self.curve.p()) {
                continue;
            }

            if let Ok(named) = curve.domain() {
                if named.is_equivalent(&self) {
                    tracing::debug!(curve = curve.name(), "explicit parameters match named curve");
                    return named;
                }
            }
        }

        Arc::new(self)
    }

    /// `AlgorithmIdentifier` for an EC public key on this curve.
    pub fn algorithm_identifier(&self, mode: EncodingMode) -> Result<AlgorithmIdentifier> {
        let parameters = Any::from_der(&self.to_der(mode)?)?;
        Ok(AlgorithmIdentifier::ec_public_key(Some(parameters)))
    }

    /// Decode the domain parameters carried by an algorithm identifier.
    pub fn from_algorithm_identifier(
        alg_id: &AlgorithmIdentifier,
        implicit: Option<&Arc<DomainParameters>>,
    ) -> Result<Arc<Self>> {
        if alg_id.oid != registry::ID_EC_PUBLIC_KEY {
            return Err(Error::decoding(format!(
                "algorithm {} is not an EC public key",
                alg_id.oid
            )));
        }

        let params = alg_id
            .parameters
            .as_ref()
            .ok_or_else(|| Error::decoding("algorithm identifier has no EC parameters"))?;

        Self::from_any(params, implicit)
    }
}

/// X.509 `AlgorithmIdentifier`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct AlgorithmIdentifier {
    /// Algorithm OID.
    pub oid: ObjectIdentifier,
    /// Algorithm parameters.
    pub parameters: Option<Any>,
}

/// `SpecifiedECDomain` restricted to prime fields.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct SpecifiedDomain {
    version: u8,
    field_id: FieldId,
    curve: CurveCoefficients,
    base: OctetString,
    order: Uint,
    cofactor: Uint,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct FieldId {
    field_type: ObjectIdentifier,
    prime: Uint,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct CurveCoefficients {
    a: OctetString,
    b: OctetString,
    seed: Option<BitString>,
}

fn uint(x: &BigUint) -> Result<Uint> {
    Ok(Uint::new(&x.to_bytes_be())?)
}

impl AlgorithmIdentifier {
    /// The identifier for `id-ecPublicKey` with the given raw parameters.
    pub fn ec_public_key(parameters: Option<Any>) -> Self {
        Self {
            oid: registry::ID_EC_PUBLIC_KEY,
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DomainParameters, MAX_EXPLICIT_FIELD_BITS};
    use crate::{Error, named::NamedCurve};
    use der::asn1::Uint;

    fn assert_size_rejected(err: Error) {
        assert!(matches!(err, Error::Decoding(ref msg) if msg.contains("bits")), "{err}");
    }

    #[test]
    fn explicit_round_trip() {
        let domain = NamedCurve::Secp256r1.domain().unwrap();
        let spec = domain.to_specified().unwrap();

        let decoded = DomainParameters::from_specified(&spec).unwrap();
        assert!(alloc::sync::Arc::ptr_eq(&decoded, &domain));
    }

    #[test]
    fn oversized_explicit_modulus() {
        let mut spec = NamedCurve::Secp256r1.domain().unwrap().to_specified().unwrap();
        let len = (MAX_EXPLICIT_FIELD_BITS / 8) as usize + 12;
        spec.field_id.prime = Uint::new(&vec![0xff; len]).unwrap();

        assert_size_rejected(DomainParameters::from_specified(&spec).unwrap_err());
    }

    #[test]
    fn oversized_explicit_order() {
        let mut spec = NamedCurve::Secp256r1.domain().unwrap().to_specified().unwrap();
        spec.order = Uint::new(&[0xff; 40]).unwrap();
        assert_size_rejected(DomainParameters::from_specified(&spec).unwrap_err());

        let mut spec = NamedCurve::Secp256r1.domain().unwrap().to_specified().unwrap();
        spec.cofactor = Uint::new(&[0x01; 34]).unwrap();
        assert_size_rejected(DomainParameters::from_specified(&spec).unwrap_err());
    }
}
