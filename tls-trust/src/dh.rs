//! Finite-field Diffie-Hellman over safe-prime groups.
//!
//! Shared secrets are the raw value `Y^x mod p`, left padded to the byte
//! length of `p`.

use crate::{Alert, Error, Result};
use core::fmt;
use ecc_key::field::{SecretModulus, to_fixed_bytes, to_fixed_bytes_secret};
use hex_literal::hex;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Exponents drawn before giving up on the random source.
const MAX_EXPONENT_ATTEMPTS: usize = 64;

/// RFC 7919 `ffdhe2048` modulus.
const FFDHE2048_P: [u8; 256] = hex!(
    "FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1D8B9C583CE2D3695
    A9E13641146433FBCC939DCE249B3EF97D2FE363630C75D8F681B202AEC4617A
    D3DF1ED5D5FD65612433F51F5F066ED0856365553DED1AF3B557135E7F57C935
    984F0C70E0E68B77E2A689DAF3EFE8721DF158A136ADE73530ACCA4F483A797A
    BC0AB182B324FB61D108A94BB2C8E3FBB96ADAB760D7F4681D4F42A3DE394DF4
    AE56EDE76372BB190B07A7C8EE0A6D709E02FCE1CDF7E2ECC03404CD28342F61
    9172FE9CE98583FF8E4F1232EEF28183C3FE3B1B4C6FAD733BB5FCBC2EC22005
    C58EF1837D1683B2C6F34A26C1B2EFFA886B423861285C97FFFFFFFFFFFFFFFF"
);

/// RFC 7919 `ffdhe3072` modulus.
const FFDHE3072_P: [u8; 384] = hex!(
    "FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1D8B9C583CE2D3695
    A9E13641146433FBCC939DCE249B3EF97D2FE363630C75D8F681B202AEC4617A
    D3DF1ED5D5FD65612433F51F5F066ED0856365553DED1AF3B557135E7F57C935
    984F0C70E0E68B77E2A689DAF3EFE8721DF158A136ADE73530ACCA4F483A797A
    BC0AB182B324FB61D108A94BB2C8E3FBB96ADAB760D7F4681D4F42A3DE394DF4
    AE56EDE76372BB190B07A7C8EE0A6D709E02FCE1CDF7E2ECC03404CD28342F61
    9172FE9CE98583FF8E4F1232EEF28183C3FE3B1B4C6FAD733BB5FCBC2EC22005
    C58EF1837D1683B2C6F34A26C1B2EFFA886B4238611FCFDCDE355B3B6519035B
    BC34F4DEF99C023861B46FC9D6E6C9077AD91D2691F7F7EE598CB0FAC186D91C
    AEFE130985139270B4130C93BC437944F4FD4452E2D74DD364F2E21E71F54BFF
    5CAE82AB9C9DF69EE86D2BC522363A0DABC521979B0DEADA1DBF9A42D5C4484E
    0ABCD06BFA53DDEF3C1B20EE3FD59D7C25E41D2B66C62E37FFFFFFFFFFFFFFFF"
);

/// RFC 7919 `ffdhe4096` modulus.
const FFDHE4096_P: [u8; 512] = hex!(
    "FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1D8B9C583CE2D3695
    A9E13641146433FBCC939DCE249B3EF97D2FE363630C75D8F681B202AEC4617A
    D3DF1ED5D5FD65612433F51F5F066ED0856365553DED1AF3B557135E7F57C935
    984F0C70E0E68B77E2A689DAF3EFE8721DF158A136ADE73530ACCA4F483A797A
    BC0AB182B324FB61D108A94BB2C8E3FBB96ADAB760D7F4681D4F42A3DE394DF4
    AE56EDE76372BB190B07A7C8EE0A6D709E02FCE1CDF7E2ECC03404CD28342F61
    9172FE9CE98583FF8E4F1232EEF28183C3FE3B1B4C6FAD733BB5FCBC2EC22005
    C58EF1837D1683B2C6F34A26C1B2EFFA886B4238611FCFDCDE355B3B6519035B
    BC34F4DEF99C023861B46FC9D6E6C9077AD91D2691F7F7EE598CB0FAC186D91C
    AEFE130985139270B4130C93BC437944F4FD4452E2D74DD364F2E21E71F54BFF
    5CAE82AB9C9DF69EE86D2BC522363A0DABC521979B0DEADA1DBF9A42D5C4484E
    0ABCD06BFA53DDEF3C1B20EE3FD59D7C25E41D2B669E1EF16E6F52C3164DF4FB
    7930E9E4E58857B6AC7D5F42D69F6D187763CF1D5503400487F55BA57E31CC7A
    7135C886EFB4318AED6A1E012D9E6832A907600A918130C46DC778F971AD0038
    092999A333CB8B7A1A1DB93D7140003C2A4ECEA9F98D0ACC0A8291CDCEC97DCF
    8EC9B55A7F88A46B4DB5A851F44182E1C68A007E5E655F6AFFFFFFFFFFFFFFFF"
);

/// Multiplicative group parameters: modulus `p`, generator `g` and, when
/// known, the order `q` of the subgroup `g` generates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DhGroup {
    p: BigUint,
    g: BigUint,
    q: Option<BigUint>,
}

impl DhGroup {
    /// Build a group from explicit parameters.
    ///
    /// `p` must be odd and greater than 3, `g` must lie in `(1, p - 1)` and
    /// `q`, when given, must be at least 4 and divide `p - 1`. Primality of
    /// `p` is not checked.
    pub fn new(p: BigUint, g: BigUint, q: Option<BigUint>) -> Result<Self> {
        let one = BigUint::one();

        if p <= BigUint::from(3u32) || !p.bit(0) {
            return Err(Error::InvalidArgument(
                "DH modulus must be odd and greater than 3".into(),
            ));
        }

        let p_minus_1 = &p - &one;

        if g <= one || g >= p_minus_1 {
            return Err(Error::InvalidArgument("DH generator is out of range".into()));
        }

        if let Some(q) = &q {
            if q.bits() < 3 {
                return Err(Error::InvalidArgument(
                    "DH subgroup order is too small".into(),
                ));
            }

            if !(&p_minus_1 % q).is_zero() {
                return Err(Error::InvalidArgument(
                    "DH subgroup order does not divide p - 1".into(),
                ));
            }
        }

        Ok(Self { p, g, q })
    }

    /// RFC 7919 `ffdhe2048`.
    pub fn ffdhe2048() -> Self {
        Self::safe_prime(&FFDHE2048_P)
    }

    /// RFC 7919 `ffdhe3072`.
    pub fn ffdhe3072() -> Self {
        Self::safe_prime(&FFDHE3072_P)
    }

    /// RFC 7919 `ffdhe4096`.
    pub fn ffdhe4096() -> Self {
        Self::safe_prime(&FFDHE4096_P)
    }

    /// Group for a safe prime `p = 2q + 1` with generator 2.
    fn safe_prime(p: &[u8]) -> Self {
        let p = BigUint::from_bytes_be(p);
        let q = (&p - 1u32) >> 1u32;

        Self {
            p,
            g: BigUint::from(2u32),
            q: Some(q),
        }
    }

    /// The modulus `p`.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// The generator `g`.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// The subgroup order `q`, if known.
    pub fn q(&self) -> Option<&BigUint> {
        self.q.as_ref()
    }

    /// Bit length of `p`.
    pub fn p_bits(&self) -> usize {
        self.p.bits() as usize
    }

    /// Byte length of `p`.
    pub fn p_bytes(&self) -> usize {
        self.p_bits().div_ceil(8)
    }

    /// Approximate security level in bits, after NIST SP 800-57.
    pub fn estimated_strength(&self) -> usize {
        match self.p_bits() {
            0..=1024 => 80,
            1025..=2048 => 112,
            2049..=3072 => 128,
            3073..=4096 => 152,
            4097..=6144 => 176,
            6145..=8192 => 200,
            _ => 256,
        }
    }

    /// Bit length of freshly generated private exponents.
    fn exponent_bits(&self) -> usize {
        let limit = self.q.as_ref().unwrap_or(&self.p).bits() as usize - 1;
        (2 * self.estimated_strength()).min(limit)
    }

    fn encode(&self, x: &BigUint) -> Vec<u8> {
        to_fixed_bytes(x, self.p_bytes())
    }
}

/// Peer's public value `Y`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DhPublicKey {
    group: DhGroup,
    y: BigUint,
}

impl DhPublicKey {
    /// Wrap a public value. Range checks are the key exchange's job.
    pub fn new(group: DhGroup, y: BigUint) -> Self {
        Self { group, y }
    }

    /// Group parameters.
    pub fn group(&self) -> &DhGroup {
        &self.group
    }

    /// The value `Y`.
    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// Bit length of the group modulus.
    pub fn key_length(&self) -> usize {
        self.group.p_bits()
    }

    /// `Y` left padded to the byte length of `p`.
    pub fn public_value(&self) -> Vec<u8> {
        self.group.encode(&self.y)
    }
}

/// Ephemeral Diffie-Hellman private exponent with its public value.
///
/// The exponent is zeroized on drop.
#[derive(Clone)]
pub struct DhPrivateKey {
    public: DhPublicKey,
    x: Vec<u8>,
}

impl DhPrivateKey {
    /// Draw a fresh exponent.
    pub fn generate(group: DhGroup, rng: &mut impl CryptoRngCore) -> Result<Self> {
        let bits = group.exponent_bits();
        let len = bits.div_ceil(8);
        let excess = len * 8 - bits;
        let mut buf = Zeroizing::new(vec![0u8; len]);

        for _ in 0..MAX_EXPONENT_ATTEMPTS {
            rng.fill_bytes(buf.as_mut_slice());
            buf[0] &= 0xff >> excess;

            let (high, low) = buf.split_at(len - 1);

            if high.iter().any(|&b| b != 0) || low[0] > 1 {
                tracing::debug!(bits = group.p_bits(), "generated DH private key");
                return Self::from_exponent_bytes(group, &buf);
            }
        }

        Err(Error::tls(
            Alert::InternalError,
            "random source failed to produce a DH exponent",
        ))
    }

    /// Key pair for a known exponent `1 < x < p`.
    pub fn from_exponent(group: DhGroup, x: &BigUint) -> Result<Self> {
        if *x <= BigUint::one() || *x >= group.p {
            return Err(Error::InvalidArgument("DH exponent is out of range".into()));
        }

        let x = to_fixed_bytes_secret(x, group.p_bytes());
        Self::from_exponent_bytes(group, &x)
    }

    /// `x` is big endian and no wider than `p`.
    fn from_exponent_bytes(group: DhGroup, x: &[u8]) -> Result<Self> {
        let modulus = SecretModulus::new(&group.p)?;
        let y = modulus.pow(&group.encode(&group.g), x)?;

        Ok(Self {
            x: x.to_vec(),
            public: DhPublicKey::new(group, BigUint::from_bytes_be(&y)),
        })
    }

    /// Group parameters.
    pub fn group(&self) -> &DhGroup {
        &self.public.group
    }

    /// Public half.
    pub fn public_key(&self) -> &DhPublicKey {
        &self.public
    }

    /// Own public value, left padded to the byte length of `p`.
    pub fn public_value(&self) -> Vec<u8> {
        self.public.public_value()
    }

    /// Raw agreement `Y^x mod p`.
    pub fn agree(&self, peer: &DhPublicKey) -> Result<Zeroizing<Vec<u8>>> {
        if peer.group != self.public.group {
            return Err(Error::InvalidArgument(
                "DH keys belong to different groups".into(),
            ));
        }

        let group = self.group();
        let modulus = SecretModulus::new(&group.p)?;

        Ok(modulus.pow(&group.encode(&(&peer.y % &group.p)), &self.x)?)
    }
}

impl fmt::Debug for DhPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhPrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Drop for DhPrivateKey {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

impl ZeroizeOnDrop for DhPrivateKey {}

#[cfg(test)]
mod tests {
    use super::{DhGroup, DhPrivateKey, DhPublicKey};
    use num_bigint::BigUint;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn toy_group() -> DhGroup {
        DhGroup::new(23u32.into(), 5u32.into(), Some(22u32.into())).unwrap()
    }

    #[test]
    fn ffdhe_parameters() {
        for (group, bits) in [
            (DhGroup::ffdhe2048(), 2048),
            (DhGroup::ffdhe3072(), 3072),
            (DhGroup::ffdhe4096(), 4096),
        ] {
            assert_eq!(group.p_bits(), bits);
            assert_eq!(group.g(), &BigUint::from(2u32));

            // g generates the order-q subgroup
            let q = group.q().unwrap();
            assert_eq!(group.g().modpow(q, group.p()), BigUint::from(1u32));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(DhGroup::new(22u32.into(), 5u32.into(), None).is_err());
        assert!(DhGroup::new(23u32.into(), 1u32.into(), None).is_err());
        assert!(DhGroup::new(23u32.into(), 22u32.into(), None).is_err());
        assert!(DhGroup::new(23u32.into(), 5u32.into(), Some(5u32.into())).is_err());
        assert!(DhGroup::new(23u32.into(), 5u32.into(), Some(11u32.into())).is_ok());
    }

    #[test]
    fn rejects_tiny_subgroup_order() {
        for q in [2u32, 3] {
            let err = DhGroup::new(7u32.into(), 2u32.into(), Some(q.into())).unwrap_err();
            assert!(err.to_string().contains("too small"), "{err}");
        }

        let group = DhGroup::new(11u32.into(), 3u32.into(), Some(5u32.into())).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        assert!(DhPrivateKey::generate(group, &mut rng).is_ok());
    }

    #[test]
    fn exponent_range() {
        for x in [0u32, 1, 23, 24] {
            assert!(DhPrivateKey::from_exponent(toy_group(), &x.into()).is_err());
        }
        assert!(DhPrivateKey::from_exponent(toy_group(), &22u32.into()).is_ok());
    }

    #[test]
    fn toy_agreement() {
        let key = DhPrivateKey::from_exponent(toy_group(), &6u32.into()).unwrap();
        assert_eq!(key.public_value(), [8]);

        let peer = DhPublicKey::new(toy_group(), 19u32.into());
        assert_eq!(key.agree(&peer).unwrap().as_slice(), [2]);

        // unreduced peer value
        let peer = DhPublicKey::new(toy_group(), 42u32.into());
        assert_eq!(key.agree(&peer).unwrap().as_slice(), [2]);
    }

    #[test]
    fn generated_exponents_agree() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let group = DhGroup::ffdhe2048();

        let alice = DhPrivateKey::generate(group.clone(), &mut rng).unwrap();
        let bob = DhPrivateKey::generate(group, &mut rng).unwrap();

        assert_eq!(alice.public_value().len(), 256);
        assert_eq!(
            alice.agree(bob.public_key()).unwrap(),
            bob.agree(alice.public_key()).unwrap()
        );
    }
}
