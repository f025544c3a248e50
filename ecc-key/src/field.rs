//! Arithmetic in a prime field whose modulus is only known at runtime.
//!
//! Elements are plain [`BigUint`] values kept fully reduced; every operation
//! takes and returns reduced values. Those are only ever public values:
//! secret scalars and exponents go through [`SecretModulus`] instead.

use crate::{Error, Result};
use bigint::{
    BoxedUint, Odd,
    modular::{BoxedMontyForm, BoxedMontyParams},
};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use zeroize::Zeroizing;

/// Prime field `GF(p)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrimeField {
    p: BigUint,
    byte_len: usize,
}

impl PrimeField {
    /// Create a field from an odd modulus `p > 3`.
    ///
    /// Primality is not checked here, see [`is_probable_prime`].
    pub fn new(p: BigUint) -> Result<Self> {
        if p <= BigUint::from(3u8) || p.is_even() {
            return Err(Error::invalid_argument(
                "field modulus must be an odd prime greater than 3",
            ));
        }

        let byte_len = bytes_for_bits(p.bits());
        Ok(Self { p, byte_len })
    }

    /// The modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// Bit length of `p`.
    pub fn bits(&self) -> u64 {
        self.p.bits()
    }

    /// Length in bytes of a serialized field element.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Is `x` a canonical element of this field?
    pub fn contains(&self, x: &BigUint) -> bool {
        x < &self.p
    }

    /// Returns `a + b`.
    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let sum = a + b;
        if sum >= self.p { sum - &self.p } else { sum }
    }

    /// Returns `a - b`.
    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        if a >= b { a - b } else { (a + &self.p) - b }
    }

    /// Returns `a * b`.
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    /// Returns `a²`.
    pub fn square(&self, a: &BigUint) -> BigUint {
        self.mul(a, a)
    }

    /// Returns `-a`.
    pub fn neg(&self, a: &BigUint) -> BigUint {
        if a.is_zero() { BigUint::zero() } else { &self.p - a }
    }

    /// Returns `a⁻¹`, or `None` when `a` is zero.
    pub fn invert(&self, a: &BigUint) -> Option<BigUint> {
        if a.is_zero() {
            return None;
        }

        Some(a.modpow(&(&self.p - 2u32), &self.p))
    }

    /// Returns a square root of `a`, or `None` when `a` is a non-residue.
    ///
    /// Uses the `(p + 1) / 4` exponent when `p ≡ 3 (mod 4)` and
    /// Tonelli-Shanks otherwise.
    pub fn sqrt(&self, a: &BigUint) -> Option<BigUint> {
        let p = &self.p;
        let one = BigUint::one();

        if a.is_zero() {
            return Some(BigUint::zero());
        }

        let p_minus_1 = p - &one;
        let euler = &p_minus_1 >> 1u32;

        if a.modpow(&euler, p) != one {
            return None;
        }

        if p % 4u32 == BigUint::from(3u32) {
            return Some(a.modpow(&((p + &one) >> 2u32), p));
        }

        // p - 1 = q·2^s with q odd
        let s = p_minus_1.trailing_zeros()?;
        let q = &p_minus_1 >> s;

        let mut z = BigUint::from(2u32);
        while z.modpow(&euler, p) != p_minus_1 {
            z += 1u32;
        }

        let mut m = s;
        let mut c = z.modpow(&q, p);
        let mut t = a.modpow(&q, p);
        let mut r = a.modpow(&((&q + &one) >> 1u32), p);

        while t != one {
            let mut i = 0u64;
            let mut t2i = t.clone();

            while t2i != one {
                t2i = self.square(&t2i);
                i += 1;

                if i == m {
                    return None;
                }
            }

            let b = c.modpow(&(BigUint::one() << (m - i - 1)), p);
            m = i;
            c = self.square(&b);
            t = self.mul(&t, &c);
            r = self.mul(&r, &b);
        }

        Some(r)
    }

    /// Decode a big endian field element of exactly [`Self::byte_len`] bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<BigUint> {
        if bytes.len() != self.byte_len {
            return Err(Error::decoding(format!(
                "field element must be {} bytes, got {}",
                self.byte_len,
                bytes.len()
            )));
        }

        let x = BigUint::from_bytes_be(bytes);

        if !self.contains(&x) {
            return Err(Error::decoding("field element is not reduced"));
        }

        Ok(x)
    }

    /// Encode a field element as fixed-width big endian bytes.
    pub fn encode(&self, x: &BigUint) -> Vec<u8> {
        to_fixed_bytes(x, self.byte_len)
    }
}

/// Baillie-PSW probable prime test: trial division by small primes, a
/// strong Fermat test to base 2, then a strong Lucas test with Selfridge's
/// parameter choice.
///
/// No composite passing both halves is known.
pub fn is_probable_prime(n: &BigUint) -> bool {
    const SMALL_PRIMES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < &BigUint::from(2u32) {
        return false;
    }

    for prime in SMALL_PRIMES {
        let prime = BigUint::from(prime);

        if *n == prime {
            return true;
        }

        if (n % &prime).is_zero() {
            return false;
        }
    }

    is_strong_probable_prime(n, 2) && is_strong_lucas_probable_prime(n)
}

/// Miller-Rabin round for a single base. `n` must be odd.
fn is_strong_probable_prime(n: &BigUint, base: u32) -> bool {
    let one = BigUint::one();
    let n_minus_1 = n - &one;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;
    let mut x = BigUint::from(base).modpow(&d, n);

    if x == one || x == n_minus_1 {
        return true;
    }

    for _ in 1..s {
        x = (&x * &x) % n;

        if x == n_minus_1 {
            return true;
        }
    }

    false
}

/// Strong Lucas test with `P = 1` and `Q = (1 - D) / 4`, where `D` is the
/// first of `5, -7, 9, -11, ...` with Jacobi symbol `(D/n) = -1`.
///
/// `n` must be odd and free of the small prime factors.
fn is_strong_lucas_probable_prime(n: &BigUint) -> bool {
    // no suitable D exists for squares
    let root = n.sqrt();
    if &root * &root == *n {
        return false;
    }

    let Some((d, q)) = selfridge_parameters(n) else {
        return false;
    };

    let n_plus_1 = n + 1u32;
    let s = n_plus_1.trailing_zeros().unwrap_or(0);
    let k = &n_plus_1 >> s;

    let mut u = BigUint::one();
    let mut v = BigUint::one();
    let mut qk = q.clone();

    for i in (0..k.bits() - 1).rev() {
        // U_2k = U_k·V_k, V_2k = V_k² - 2·Q^k
        u = (&u * &v) % n;
        v = sub_mod(&((&v * &v) % n), &((&qk << 1u32) % n), n);
        qk = (&qk * &qk) % n;

        if k.bit(i) {
            // U_k+1 = (U_k + V_k) / 2, V_k+1 = (D·U_k + V_k) / 2
            let u_next = half_mod((&u + &v) % n, n);
            let v_next = half_mod((&d * &u + &v) % n, n);
            u = u_next;
            v = v_next;
            qk = (&qk * &q) % n;
        }
    }

    if u.is_zero() || v.is_zero() {
        return true;
    }

    for _ in 1..s {
        v = sub_mod(&((&v * &v) % n), &((&qk << 1u32) % n), n);

        if v.is_zero() {
            return true;
        }

        qk = (&qk * &qk) % n;
    }

    false
}

/// `(D mod n, Q mod n)` for the strong Lucas test, or `None` when the search
/// exposes a factor of `n`.
fn selfridge_parameters(n: &BigUint) -> Option<(BigUint, BigUint)> {
    let mut magnitude = 5u64;
    let mut negative = false;

    loop {
        let abs = BigUint::from(magnitude);
        let d = if negative {
            sub_mod(&BigUint::zero(), &(&abs % n), n)
        } else {
            &abs % n
        };

        match jacobi(&d, n) {
            -1 => {
                // Q = (1 - D) / 4
                let q = if negative {
                    BigUint::from((magnitude + 1) / 4) % n
                } else {
                    sub_mod(&BigUint::zero(), &(BigUint::from((magnitude - 1) / 4) % n), n)
                };

                return Some((d, q));
            }
            0 if abs != *n => return None,
            _ => {}
        }

        magnitude += 2;
        negative = !negative;
    }
}

/// Jacobi symbol `(a/n)` for odd `n`.
fn jacobi(a: &BigUint, n: &BigUint) -> i8 {
    let mut a = a % n;
    let mut n = n.clone();
    let mut result = 1i8;

    while !a.is_zero() {
        while a.is_even() {
            a >>= 1u32;

            if matches!(low_bits(&n) & 7, 3 | 5) {
                result = -result;
            }
        }

        core::mem::swap(&mut a, &mut n);

        if low_bits(&a) & 3 == 3 && low_bits(&n) & 3 == 3 {
            result = -result;
        }

        a %= &n;
    }

    if n.is_one() { result } else { 0 }
}

fn low_bits(x: &BigUint) -> u32 {
    x.iter_u32_digits().next().unwrap_or(0)
}

/// `a - b mod n` for reduced `a` and `b`.
fn sub_mod(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    if a >= b { a - b } else { (a + n) - b }
}

/// `x / 2 mod n` for odd `n` and reduced `x`.
fn half_mod(x: BigUint, n: &BigUint) -> BigUint {
    if x.is_even() { x >> 1u32 } else { (x + n) >> 1u32 }
}

/// Number of bytes needed to hold `bits` bits.
pub(crate) fn bytes_for_bits(bits: u64) -> usize {
    bits.div_ceil(8) as usize
}

/// Big endian encoding of `x`, left padded with zeros to `len` bytes.
///
/// `x` must fit in `len` bytes.
pub fn to_fixed_bytes(x: &BigUint, len: usize) -> Vec<u8> {
    let bytes = if x.is_zero() { Vec::new() } else { x.to_bytes_be() };
    debug_assert!(bytes.len() <= len);

    let mut out = vec![0u8; len.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}

/// Like [`to_fixed_bytes`] for secret values: every intermediate buffer is
/// wiped on drop.
pub fn to_fixed_bytes_secret(x: &BigUint, len: usize) -> Zeroizing<Vec<u8>> {
    let raw = Zeroizing::new(x.to_bytes_be());
    let skip = raw.len().saturating_sub(len);
    let mut out = Zeroizing::new(vec![0u8; len]);

    out[len - (raw.len() - skip)..].copy_from_slice(&raw[skip..]);
    out
}

/// Overwrite the digits of `x` in place and leave it at zero.
pub(crate) fn wipe(x: &mut BigUint) {
    let digits = x.bits().div_ceil(32) as usize;
    x.assign_from_slice(&vec![0u32; digits]);
}

/// Odd modulus for arithmetic on secret values.
///
/// Operands are held in constant-time Montgomery form and every
/// intermediate carrying secret material is wiped on drop.
#[derive(Clone)]
pub struct SecretModulus {
    params: BoxedMontyParams,
    bits_precision: u32,
    byte_len: usize,
}

impl SecretModulus {
    /// Wrap an odd modulus greater than 2.
    pub fn new(modulus: &BigUint) -> Result<Self> {
        if modulus.bits() < 2 || modulus.is_even() {
            return Err(Error::invalid_argument(
                "modulus must be odd and greater than 2",
            ));
        }

        let byte_len = bytes_for_bits(modulus.bits());
        let bits_precision = u32::try_from(byte_len.div_ceil(8) * 64)
            .map_err(|_| Error::invalid_argument("modulus is too large"))?;
        let modulus = BoxedUint::from_be_slice(&modulus.to_bytes_be(), bits_precision)
            .map_err(|_| Error::Internal("modulus does not fit its precision".into()))?;
        let modulus = Option::<Odd<BoxedUint>>::from(Odd::new(modulus))
            .ok_or_else(|| Error::invalid_argument("modulus must be odd"))?;

        Ok(Self {
            params: BoxedMontyParams::new(modulus),
            bits_precision,
            byte_len,
        })
    }

    /// Length in bytes of a serialized residue.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// `base^exponent` as fixed-width big endian bytes.
    ///
    /// `base` must be reduced; `exponent` may be any value that fits in the
    /// byte length of the modulus.
    pub fn pow(&self, base: &[u8], exponent: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let base = self.element(base)?;
        let exponent = self.integer(exponent)?;
        let power = Zeroizing::new(base.pow(&exponent));

        Ok(self.to_bytes(&power))
    }

    /// Big endian bytes as an integer at the modulus precision.
    pub(crate) fn integer(&self, bytes: &[u8]) -> Result<Zeroizing<BoxedUint>> {
        if bytes.len() > self.bits_precision as usize / 8 {
            return Err(Error::invalid_argument("value is wider than the modulus"));
        }

        BoxedUint::from_be_slice(bytes, self.bits_precision)
            .map(Zeroizing::new)
            .map_err(|_| Error::invalid_argument("value is wider than the modulus"))
    }

    /// Reduced big endian bytes in Montgomery form.
    pub(crate) fn element(&self, bytes: &[u8]) -> Result<Zeroizing<BoxedMontyForm>> {
        if bytes.len() > self.bits_precision as usize / 8 {
            return Err(Error::invalid_argument("value is wider than the modulus"));
        }

        let integer = BoxedUint::from_be_slice(bytes, self.bits_precision)
            .map_err(|_| Error::invalid_argument("value is wider than the modulus"))?;

        // `new` converts `integer` in place
        Ok(Zeroizing::new(BoxedMontyForm::new(
            integer,
            self.params.clone(),
        )))
    }

    /// Canonical fixed-width big endian encoding of a residue.
    pub(crate) fn to_bytes(&self, x: &BoxedMontyForm) -> Zeroizing<Vec<u8>> {
        let value = Zeroizing::new(x.retrieve());
        let bytes = Zeroizing::new(value.to_be_bytes());

        Zeroizing::new(bytes[bytes.len() - self.byte_len..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PrimeField, SecretModulus, is_probable_prime, to_fixed_bytes, to_fixed_bytes_secret, wipe,
    };
    use num_bigint::BigUint;
    use num_traits::Zero;

    fn field(p: u64) -> PrimeField {
        PrimeField::new(BigUint::from(p)).unwrap()
    }

    #[test]
    fn rejects_even_modulus() {
        assert!(PrimeField::new(BigUint::from(22u32)).is_err());
        assert!(PrimeField::new(BigUint::from(3u32)).is_err());
    }

    #[test]
    fn sqrt_three_mod_four() {
        let f = field(23);
        for a in 1u32..23 {
            let a = BigUint::from(a);
            if let Some(r) = f.sqrt(&a) {
                assert_eq!(f.square(&r), a);
            }
        }
    }

    #[test]
    fn sqrt_tonelli_shanks() {
        // 97 - 1 = 3·2^5
        let f = field(97);
        let mut residues = 0;
        for a in 1u32..97 {
            let a = BigUint::from(a);
            if let Some(r) = f.sqrt(&a) {
                assert_eq!(f.square(&r), a);
                residues += 1;
            }
        }
        assert_eq!(residues, 48);
    }

    #[test]
    fn invert_and_negate() {
        let f = field(101);
        for a in 1u32..101 {
            let a = BigUint::from(a);
            let inv = f.invert(&a).unwrap();
            assert_eq!(f.mul(&a, &inv), BigUint::from(1u32));
            assert_eq!(f.add(&a, &f.neg(&a)), BigUint::from(0u32));
        }
        assert!(f.invert(&BigUint::from(0u32)).is_none());
    }

    #[test]
    fn decode_rejects_unreduced() {
        let f = field(251);
        assert_eq!(f.decode(&[250]).unwrap(), BigUint::from(250u32));
        assert!(f.decode(&[251]).is_err());
        assert!(f.decode(&[0, 1]).is_err());
    }

    #[test]
    fn primality() {
        let primes = [2u32, 3, 37, 41, 211, 223, 7919, 1_000_003];
        let composites = [0u32, 1, 4, 221, 561, 1105, 7917, 1_022_121];

        for p in primes {
            assert!(is_probable_prime(&BigUint::from(p)), "{p}");
        }
        for c in composites {
            assert!(!is_probable_prime(&BigUint::from(c)), "{c}");
        }
    }

    #[test]
    fn rejects_strong_pseudoprime_to_small_bases() {
        // strong pseudoprime to every prime base up to 37
        let n = BigUint::parse_bytes(b"318665857834031151167461", 10).unwrap();
        let p = BigUint::from(399_165_290_221u64);
        let q = BigUint::from(798_330_580_441u64);

        assert_eq!(&p * &q, n);
        assert!(!is_probable_prime(&n));
        assert!(is_probable_prime(&p));
        assert!(is_probable_prime(&q));
    }

    #[test]
    fn rejects_base_two_pseudoprimes() {
        // 2047 = 23·89 and 3277 = 29·113 are strong pseudoprimes to base 2
        for c in [2047u32, 3277, 4033, 4681, 8321] {
            assert!(!is_probable_prime(&BigUint::from(c)), "{c}");
        }
    }

    #[test]
    fn accepts_large_primes() {
        // 2^127 - 1 and the P-256 modulus
        let m127 = (BigUint::from(1u32) << 127u32) - 1u32;
        let p256 = BigUint::parse_bytes(
            b"ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
            16,
        )
        .unwrap();

        assert!(is_probable_prime(&m127));
        assert!(is_probable_prime(&p256));
        assert!(!is_probable_prime(&(&m127 * &p256)));
    }

    #[test]
    fn secret_modular_power() {
        let m = SecretModulus::new(&BigUint::from(23u32)).unwrap();
        assert_eq!(m.byte_len(), 1);
        assert_eq!(m.pow(&[5], &[6]).unwrap().as_slice(), [8]);
        assert_eq!(m.pow(&[19], &[6]).unwrap().as_slice(), [2]);

        assert!(SecretModulus::new(&BigUint::from(22u32)).is_err());
        assert!(m.pow(&[5], &[0; 9]).is_err());
    }

    #[test]
    fn wipe_clears_value() {
        let mut x = BigUint::from_bytes_be(&[0xa5; 40]);
        wipe(&mut x);
        assert!(x.is_zero());
    }

    #[test]
    fn fixed_width_encoding() {
        assert_eq!(to_fixed_bytes(&BigUint::from(0u32), 3), [0, 0, 0]);
        assert_eq!(to_fixed_bytes(&BigUint::from(0x0102u32), 4), [0, 0, 1, 2]);
        assert_eq!(to_fixed_bytes_secret(&BigUint::from(0u32), 2).as_slice(), [0, 0]);
        assert_eq!(
            to_fixed_bytes_secret(&BigUint::from(0x0102u32), 4).as_slice(),
            [0, 0, 1, 2]
        );
    }
}
