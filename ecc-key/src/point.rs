//! Short Weierstrass curves `y² = x³ + ax + b` over a [`PrimeField`], and
//! points on them.
//!
//! Arithmetic uses the complete formulas from [Renes-Costello-Batina 2015],
//! which are exception-free on curves whose group order is odd.
//!
//! [Renes-Costello-Batina 2015]: https://eprint.iacr.org/2015/1060

use crate::{Error, Result, field::PrimeField};
use alloc::sync::Arc;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use zeroize::Zeroizing;

/// Curve equation `y² = x³ + ax + b (mod p)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Curve {
    field: PrimeField,
    a: BigUint,
    b: BigUint,
    b3: BigUint,
}

impl Curve {
    /// Create a new curve, rejecting unreduced coefficients and singular
    /// equations (`4a³ + 27b² = 0`).
    pub fn new(p: BigUint, a: BigUint, b: BigUint) -> Result<Self> {
        let field = PrimeField::new(p)?;

        if !field.contains(&a) || !field.contains(&b) {
            return Err(Error::invalid_argument(
                "curve coefficients must be reduced modulo p",
            ));
        }

        let a3 = field.mul(&field.square(&a), &a);
        let discriminant = field.add(
            &field.mul(&BigUint::from(4u32), &a3),
            &field.mul(&BigUint::from(27u32), &field.square(&b)),
        );

        if discriminant.is_zero() {
            return Err(Error::invalid_argument("curve equation is singular"));
        }

        let b3 = field.mul(&b, &BigUint::from(3u32));
        Ok(Self { field, a, b, b3 })
    }

    /// Base field.
    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    /// Coefficient `a`.
    pub fn a(&self) -> &BigUint {
        &self.a
    }

    /// Coefficient `b`.
    pub fn b(&self) -> &BigUint {
        &self.b
    }

    /// Field modulus `p`.
    pub fn p(&self) -> &BigUint {
        self.field.modulus()
    }

    /// Does `(x, y)` satisfy the curve equation with reduced coordinates?
    pub fn contains(&self, x: &BigUint, y: &BigUint) -> bool {
        self.field.contains(x) && self.field.contains(y) && self.field.square(y) == self.rhs(x)
    }

    /// `x³ + ax + b`
    fn rhs(&self, x: &BigUint) -> BigUint {
        let f = &self.field;
        let x3 = f.mul(&f.square(x), x);
        f.add(&f.add(&x3, &f.mul(&self.a, x)), &self.b)
    }
}

/// SEC1 point serialization forms.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PointFormat {
    /// `02 || x` or `03 || x`
    #[default]
    Compressed,
    /// `04 || x || y`
    Uncompressed,
    /// `06 || x || y` or `07 || x || y`
    Hybrid,
}

/// A point on a specific [`Curve`], in affine coordinates.
///
/// Construction through [`EcPoint::new`] does not validate the
/// coordinates: use [`EcPoint::check_invariants`] before trusting a point.
/// [`EcPoint::decode`] validates as part of decoding.
#[derive(Clone, Debug)]
pub struct EcPoint {
    curve: Arc<Curve>,
    /// `None` is the point at infinity.
    coords: Option<(BigUint, BigUint)>,
}

impl EcPoint {
    /// Point with the given affine coordinates.
    pub fn new(curve: Arc<Curve>, x: BigUint, y: BigUint) -> Self {
        Self {
            curve,
            coords: Some((x, y)),
        }
    }

    /// The point at infinity.
    pub fn identity(curve: Arc<Curve>) -> Self {
        Self {
            curve,
            coords: None,
        }
    }

    /// Curve this point belongs to.
    pub fn curve(&self) -> &Arc<Curve> {
        &self.curve
    }

    /// Is this the point at infinity?
    pub fn is_identity(&self) -> bool {
        self.coords.is_none()
    }

    /// Affine x-coordinate, `None` for the identity.
    pub fn x(&self) -> Option<&BigUint> {
        self.coords.as_ref().map(|(x, _)| x)
    }

    /// Affine y-coordinate, `None` for the identity.
    pub fn y(&self) -> Option<&BigUint> {
        self.coords.as_ref().map(|(_, y)| y)
    }

    pub(crate) fn into_coordinates(self) -> Option<(BigUint, BigUint)> {
        self.coords
    }

    /// Is the point on its curve? The identity counts as on the curve.
    pub fn on_the_curve(&self) -> bool {
        match &self.coords {
            None => true,
            Some((x, y)) => self.curve.contains(x, y),
        }
    }

    /// Check that this point is a usable public value: on the curve and not
    /// the identity.
    pub fn check_invariants(&self) -> Result<()> {
        if self.is_identity() {
            return Err(Error::invalid_point("point is the point at infinity"));
        }

        if !self.on_the_curve() {
            return Err(Error::invalid_point("point is not on the curve"));
        }

        Ok(())
    }

    /// Decode a SEC1 point encoding relative to `curve`.
    ///
    /// Malformed framing (unknown tag, wrong length, unreduced coordinate) is
    /// [`Error::Decoding`]; a well-formed encoding of something that is not a
    /// curve point is [`Error::InvalidPoint`].
    pub fn decode(curve: &Arc<Curve>, bytes: &[u8]) -> Result<Self> {
        let field = curve.field();
        let len = field.byte_len();

        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::decoding("empty point encoding"))?;

        match tag {
            0x00 if rest.is_empty() => Ok(Self::identity(curve.clone())),
            0x02 | 0x03 => {
                if rest.len() != len {
                    return Err(Error::decoding("invalid compressed point length"));
                }

                let x = field.decode(rest)?;
                Self::decompress(curve, x, tag == 0x03)
            }
            0x04 | 0x06 | 0x07 => {
                if rest.len() != 2 * len {
                    return Err(Error::decoding("invalid uncompressed point length"));
                }

                let x = field.decode(&rest[..len])?;
                let y = field.decode(&rest[len..])?;

                if tag != 0x04 && y.is_odd() != (tag == 0x07) {
                    return Err(Error::invalid_point("hybrid point has the wrong y parity"));
                }

                let point = Self::new(curve.clone(), x, y);

                if !point.on_the_curve() {
                    return Err(Error::invalid_point("point is not on the curve"));
                }

                Ok(point)
            }
            _ => Err(Error::decoding(format!(
                "unknown point encoding tag 0x{tag:02x}"
            ))),
        }
    }

    fn decompress(curve: &Arc<Curve>, x: BigUint, y_is_odd: bool) -> Result<Self> {
        let field = curve.field();
        let alpha = curve.rhs(&x);
        let beta = field
            .sqrt(&alpha)
            .ok_or_else(|| Error::invalid_point("x coordinate has no point on the curve"))?;

        let y = if beta.is_odd() == y_is_odd {
            beta
        } else {
            field.neg(&beta)
        };

        Ok(Self::new(curve.clone(), x, y))
    }

    /// SEC1 encoding of this point. The identity encodes as a single zero
    /// byte regardless of `format`.
    pub fn encode(&self, format: PointFormat) -> Vec<u8> {
        let (x, y) = match &self.coords {
            None => return vec![0],
            Some(coords) => coords,
        };

        let field = self.curve.field();
        let y_bit = u8::from(y.is_odd());
        let mut out = Vec::with_capacity(1 + 2 * field.byte_len());

        match format {
            PointFormat::Compressed => {
                out.push(0x02 | y_bit);
                out.extend_from_slice(&field.encode(x));
            }
            PointFormat::Uncompressed => {
                out.push(0x04);
                out.extend_from_slice(&field.encode(x));
                out.extend_from_slice(&field.encode(y));
            }
            PointFormat::Hybrid => {
                out.push(0x06 | y_bit);
                out.extend_from_slice(&field.encode(x));
                out.extend_from_slice(&field.encode(y));
            }
        }

        out
    }

    /// Returns `self + other`.
    pub fn add(&self, other: &EcPoint) -> Result<EcPoint> {
        self.same_curve(other)?;
        let sum = ProjectivePoint::from_affine(self)
            .add(&ProjectivePoint::from_affine(other), &self.curve);
        Ok(sum.to_affine(&self.curve))
    }

    /// Returns `-self`.
    pub fn neg(&self) -> EcPoint {
        match &self.coords {
            None => self.clone(),
            Some((x, y)) => Self::new(self.curve.clone(), x.clone(), self.curve.field().neg(y)),
        }
    }

    /// Returns `k · self`.
    pub fn mul(&self, k: &BigUint) -> EcPoint {
        let width = self.curve.field().byte_len().max(k.bits().div_ceil(8) as usize);
        let mut k_le = k.to_bytes_le();
        k_le.resize(width, 0);

        ProjectivePoint::from_affine(self)
            .mul(&k_le, &self.curve)
            .to_affine(&self.curve)
    }

    /// Returns `k · self` for a secret big endian scalar.
    ///
    /// The little endian working copy of `k` is wiped before returning.
    pub fn mul_secret(&self, k: &[u8]) -> EcPoint {
        let width = self.curve.field().byte_len().max(k.len());
        let mut k_le = Zeroizing::new(vec![0u8; width]);

        for (dst, src) in k_le.iter_mut().zip(k.iter().rev()) {
            *dst = *src;
        }

        ProjectivePoint::from_affine(self)
            .mul(&k_le, &self.curve)
            .to_affine(&self.curve)
    }

    /// Returns `a · self + b · other`.
    pub fn mul2(&self, a: &BigUint, other: &EcPoint, b: &BigUint) -> Result<EcPoint> {
        self.same_curve(other)?;
        self.mul(a).add(&other.mul(b))
    }

    fn same_curve(&self, other: &EcPoint) -> Result<()> {
        if Arc::ptr_eq(&self.curve, &other.curve) || self.curve == other.curve {
            Ok(())
        } else {
            Err(Error::invalid_argument("points are on different curves"))
        }
    }
}

impl PartialEq for EcPoint {
    fn eq(&self, other: &Self) -> bool {
        self.same_curve(other).is_ok() && self.coords == other.coords
    }
}

impl Eq for EcPoint {}

/// Point in homogeneous projective coordinates `(X : Y : Z)`.
#[derive(Clone, Debug)]
struct ProjectivePoint {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl ProjectivePoint {
    fn identity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn from_affine(point: &EcPoint) -> Self {
        let p = point.curve.p();

        match &point.coords {
            None => Self::identity(),
            Some((x, y)) => Self {
                x: x % p,
                y: y % p,
                z: BigUint::one(),
            },
        }
    }

    fn to_affine(&self, curve: &Arc<Curve>) -> EcPoint {
        let field = curve.field();

        match field.invert(&self.z) {
            None => EcPoint::identity(curve.clone()),
            Some(z_inv) => EcPoint::new(
                curve.clone(),
                field.mul(&self.x, &z_inv),
                field.mul(&self.y, &z_inv),
            ),
        }
    }

    /// Implements the complete addition formula from Renes-Costello-Batina
    /// 2015 (Algorithm 1). The comments after each line indicate which
    /// algorithm steps are being performed.
    fn add(&self, rhs: &Self, curve: &Curve) -> Self {
        let f = curve.field();
        let a = curve.a();
        let b3 = &curve.b3;

        let t0 = f.mul(&self.x, &rhs.x); // 1
        let t1 = f.mul(&self.y, &rhs.y); // 2
        let t2 = f.mul(&self.z, &rhs.z); // 3
        let t3 = f.add(&self.x, &self.y); // 4
        let t4 = f.add(&rhs.x, &rhs.y); // 5
        let t3 = f.mul(&t3, &t4); // 6
        let t4 = f.add(&t0, &t1); // 7
        let t3 = f.sub(&t3, &t4); // 8
        let t4 = f.add(&self.x, &self.z); // 9
        let t5 = f.add(&rhs.x, &rhs.z); // 10
        let t4 = f.mul(&t4, &t5); // 11
        let t5 = f.add(&t0, &t2); // 12
        let t4 = f.sub(&t4, &t5); // 13
        let t5 = f.add(&self.y, &self.z); // 14
        let x3 = f.add(&rhs.y, &rhs.z); // 15
        let t5 = f.mul(&t5, &x3); // 16
        let x3 = f.add(&t1, &t2); // 17
        let t5 = f.sub(&t5, &x3); // 18
        let z3 = f.mul(a, &t4); // 19
        let x3 = f.mul(b3, &t2); // 20
        let z3 = f.add(&x3, &z3); // 21
        let x3 = f.sub(&t1, &z3); // 22
        let z3 = f.add(&t1, &z3); // 23
        let y3 = f.mul(&x3, &z3); // 24
        let t1 = f.add(&t0, &t0); // 25
        let t1 = f.add(&t1, &t0); // 26
        let t2 = f.mul(a, &t2); // 27
        let t4 = f.mul(b3, &t4); // 28
        let t1 = f.add(&t1, &t2); // 29
        let t2 = f.sub(&t0, &t2); // 30
        let t2 = f.mul(a, &t2); // 31
        let t4 = f.add(&t4, &t2); // 32
        let t0 = f.mul(&t1, &t4); // 33
        let y3 = f.add(&y3, &t0); // 34
        let t0 = f.mul(&t5, &t4); // 35
        let x3 = f.mul(&t3, &x3); // 36
        let x3 = f.sub(&x3, &t0); // 37
        let t0 = f.mul(&t3, &t1); // 38
        let z3 = f.mul(&t5, &z3); // 39
        let z3 = f.add(&z3, &t0); // 40

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Implements the exception-free point doubling formula from
    /// Renes-Costello-Batina 2015 (Algorithm 3). The comments after each line
    /// indicate which algorithm steps are being performed.
    fn double(&self, curve: &Curve) -> Self {
        let f = curve.field();
        let a = curve.a();
        let b3 = &curve.b3;

        let t0 = f.square(&self.x); // 1
        let t1 = f.square(&self.y); // 2
        let t2 = f.square(&self.z); // 3
        let t3 = f.mul(&self.x, &self.y); // 4
        let t3 = f.add(&t3, &t3); // 5
        let z3 = f.mul(&self.x, &self.z); // 6
        let z3 = f.add(&z3, &z3); // 7
        let x3 = f.mul(a, &z3); // 8
        let y3 = f.mul(b3, &t2); // 9
        let y3 = f.add(&x3, &y3); // 10
        let x3 = f.sub(&t1, &y3); // 11
        let y3 = f.add(&t1, &y3); // 12
        let y3 = f.mul(&x3, &y3); // 13
        let x3 = f.mul(&t3, &x3); // 14
        let z3 = f.mul(b3, &z3); // 15
        let t2 = f.mul(a, &t2); // 16
        let t3 = f.sub(&t0, &t2); // 17
        let t3 = f.mul(a, &t3); // 18
        let t3 = f.add(&t3, &z3); // 19
        let z3 = f.add(&t0, &t0); // 20
        let t0 = f.add(&z3, &t0); // 21
        let t0 = f.add(&t0, &t2); // 22
        let t0 = f.mul(&t0, &t3); // 23
        let y3 = f.add(&y3, &t0); // 24
        let t2 = f.mul(&self.y, &self.z); // 25
        let t2 = f.add(&t2, &t2); // 26
        let t0 = f.mul(&t2, &t3); // 27
        let x3 = f.sub(&x3, &t0); // 28
        let z3 = f.mul(&t2, &t1); // 29
        let z3 = f.add(&z3, &z3); // 30
        let z3 = f.add(&z3, &z3); // 31

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Fixed 4-bit window multiplication by a little endian scalar.
    fn mul(&self, k: &[u8], curve: &Curve) -> Self {
        let mut pc = Vec::with_capacity(16);
        pc.push(Self::identity());
        pc.push(self.clone());

        for i in 2..16 {
            let next = if i % 2 == 0 {
                pc[i / 2].double(curve)
            } else {
                pc[i - 1].add(self, curve)
            };
            pc.push(next);
        }

        let mut q = Self::identity();

        if k.is_empty() {
            return q;
        }

        let mut pos = k.len() * 8 - 4;

        loop {
            let slot = ((k[pos >> 3] >> (pos & 7)) & 0xf) as usize;
            q = q.add(&pc[slot], curve);

            if pos == 0 {
                break;
            }

            q = q.double(curve).double(curve).double(curve).double(curve);
            pos -= 4;
        }

        q
    }
}

#[cfg(test)]
mod tests {
    use super::{Curve, EcPoint, PointFormat};
    use crate::Error;
    use alloc::sync::Arc;
    use num_bigint::BigUint;

    /// `y² = x³ + x + 1` over GF(211) has prime order 223.
    fn toy_curve() -> Arc<Curve> {
        Arc::new(Curve::new(211u32.into(), 1u32.into(), 1u32.into()).unwrap())
    }

    fn toy_generator(curve: &Arc<Curve>) -> EcPoint {
        EcPoint::new(curve.clone(), 0u32.into(), 1u32.into())
    }

    /// Textbook affine addition used as an oracle.
    fn affine_add(curve: &Curve, p: &EcPoint, q: &EcPoint) -> EcPoint {
        let f = curve.field();
        let curve_arc = Arc::new(curve.clone());

        let (Some((x1, y1)), Some((x2, y2))) = (&p.coords, &q.coords) else {
            return if p.is_identity() { q.clone() } else { p.clone() };
        };

        let lambda = if x1 == x2 {
            if f.add(y1, y2) == BigUint::from(0u32) {
                return EcPoint::identity(curve_arc);
            }
            let num = f.add(&f.mul(&BigUint::from(3u32), &f.square(x1)), curve.a());
            let den = f.add(y1, y1);
            f.mul(&num, &f.invert(&den).unwrap())
        } else {
            f.mul(&f.sub(y2, y1), &f.invert(&f.sub(x2, x1)).unwrap())
        };

        let x3 = f.sub(&f.sub(&f.square(&lambda), x1), x2);
        let y3 = f.sub(&f.mul(&lambda, &f.sub(x1, &x3)), y1);
        EcPoint::new(curve_arc, x3, y3)
    }

    #[test]
    fn rejects_singular_curve() {
        // 4·(-3)³ + 27·2² = -108 + 108 = 0
        let p = BigUint::from(211u32);
        let a = &p - 3u32;
        assert!(matches!(
            Curve::new(p, a, 2u32.into()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn scalar_mul_matches_repeated_addition() {
        let curve = toy_curve();
        let g = toy_generator(&curve);
        let mut acc = EcPoint::identity(curve.clone());

        for k in 0u32..=223 {
            assert_eq!(g.mul(&BigUint::from(k)), acc, "k = {k}");
            acc = affine_add(&curve, &acc, &g);
        }

        assert!(g.mul(&BigUint::from(223u32)).is_identity());
    }

    #[test]
    fn secret_scalar_mul_matches_public() {
        let curve = toy_curve();
        let g = toy_generator(&curve);

        for k in [1u32, 2, 15, 16, 77, 222] {
            let bytes = BigUint::from(k).to_bytes_be();
            assert_eq!(g.mul_secret(&bytes), g.mul(&BigUint::from(k)), "k = {k}");
        }

        assert!(g.mul_secret(&[0, 223]).is_identity());
    }

    #[test]
    fn add_handles_doubling_and_inverse() {
        let curve = toy_curve();
        let g = toy_generator(&curve);

        assert_eq!(g.add(&g).unwrap(), g.mul(&BigUint::from(2u32)));
        assert!(g.add(&g.neg()).unwrap().is_identity());
        assert_eq!(g.add(&EcPoint::identity(curve.clone())).unwrap(), g);
    }

    #[test]
    fn encodings_decode_to_same_point() {
        let curve = toy_curve();
        let p = toy_generator(&curve).mul(&BigUint::from(77u32));

        for format in [
            PointFormat::Compressed,
            PointFormat::Uncompressed,
            PointFormat::Hybrid,
        ] {
            let bytes = p.encode(format);
            assert_eq!(EcPoint::decode(&curve, &bytes).unwrap(), p);
        }
    }

    #[test]
    fn decode_distinguishes_framing_from_invalid_points() {
        let curve = toy_curve();

        assert!(matches!(
            EcPoint::decode(&curve, &[]),
            Err(Error::Decoding(_))
        ));
        assert!(matches!(
            EcPoint::decode(&curve, &[0x05, 0x00]),
            Err(Error::Decoding(_))
        ));
        assert!(matches!(
            EcPoint::decode(&curve, &[0x04, 0x00]),
            Err(Error::Decoding(_))
        ));
        // x = 212 is not reduced
        assert!(matches!(
            EcPoint::decode(&curve, &[0x02, 0xd4]),
            Err(Error::Decoding(_))
        ));
        // (0, 2) is well formed but 4 != 1
        assert!(matches!(
            EcPoint::decode(&curve, &[0x04, 0x00, 0x02]),
            Err(Error::InvalidPoint(_))
        ));
        // 06 announces an even y, but y = 1
        assert!(matches!(
            EcPoint::decode(&curve, &[0x06, 0x00, 0x01]),
            Err(Error::InvalidPoint(_))
        ));
        assert!(EcPoint::decode(&curve, &[0x00]).unwrap().is_identity());
    }

    #[test]
    fn identity_fails_invariants() {
        let curve = toy_curve();
        assert!(matches!(
            EcPoint::identity(curve.clone()).check_invariants(),
            Err(Error::InvalidPoint(_))
        ));
        assert!(toy_generator(&curve).check_invariants().is_ok());
    }
}
