//! TLS named groups and the selector handed to the key exchange.

use crate::dh::DhGroup;
use core::fmt;
use ecc_key::NamedCurve;
use serde::Deserialize;

/// IANA TLS `NamedGroup` registry entries known to this crate.
///
/// Codes outside the table are preserved as [`NamedGroup::Unknown`] so they
/// can be reported back.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum NamedGroup {
    /// `secp256r1` (23)
    Secp256r1,
    /// `secp384r1` (24)
    Secp384r1,
    /// `secp521r1` (25)
    Secp521r1,
    /// `brainpoolP256r1` (26)
    BrainpoolP256r1,
    /// `brainpoolP384r1` (27)
    BrainpoolP384r1,
    /// `brainpoolP512r1` (28)
    BrainpoolP512r1,
    /// `x25519` (29)
    X25519,
    /// `x448` (30)
    X448,
    /// `brainpoolP256r1tls13` (31)
    BrainpoolP256r1Tls13,
    /// `brainpoolP384r1tls13` (32)
    BrainpoolP384r1Tls13,
    /// `brainpoolP512r1tls13` (33)
    BrainpoolP512r1Tls13,
    /// `ffdhe2048` (256)
    Ffdhe2048,
    /// `ffdhe3072` (257)
    Ffdhe3072,
    /// `ffdhe4096` (258)
    Ffdhe4096,
    /// Any other code point.
    Unknown(u16),
}

impl NamedGroup {
    /// Every group with a name, in registry order.
    pub const KNOWN: [NamedGroup; 14] = [
        NamedGroup::Secp256r1,
        NamedGroup::Secp384r1,
        NamedGroup::Secp521r1,
        NamedGroup::BrainpoolP256r1,
        NamedGroup::BrainpoolP384r1,
        NamedGroup::BrainpoolP512r1,
        NamedGroup::X25519,
        NamedGroup::X448,
        NamedGroup::BrainpoolP256r1Tls13,
        NamedGroup::BrainpoolP384r1Tls13,
        NamedGroup::BrainpoolP512r1Tls13,
        NamedGroup::Ffdhe2048,
        NamedGroup::Ffdhe3072,
        NamedGroup::Ffdhe4096,
    ];

    /// Wire code point.
    pub fn code(self) -> u16 {
        match self {
            NamedGroup::Secp256r1 => 23,
            NamedGroup::Secp384r1 => 24,
            NamedGroup::Secp521r1 => 25,
            NamedGroup::BrainpoolP256r1 => 26,
            NamedGroup::BrainpoolP384r1 => 27,
            NamedGroup::BrainpoolP512r1 => 28,
            NamedGroup::X25519 => 29,
            NamedGroup::X448 => 30,
            NamedGroup::BrainpoolP256r1Tls13 => 31,
            NamedGroup::BrainpoolP384r1Tls13 => 32,
            NamedGroup::BrainpoolP512r1Tls13 => 33,
            NamedGroup::Ffdhe2048 => 256,
            NamedGroup::Ffdhe3072 => 257,
            NamedGroup::Ffdhe4096 => 258,
            NamedGroup::Unknown(code) => code,
        }
    }

    /// Registry name, `None` for unknown code points.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            NamedGroup::Secp256r1 => "secp256r1",
            NamedGroup::Secp384r1 => "secp384r1",
            NamedGroup::Secp521r1 => "secp521r1",
            NamedGroup::BrainpoolP256r1 => "brainpoolP256r1",
            NamedGroup::BrainpoolP384r1 => "brainpoolP384r1",
            NamedGroup::BrainpoolP512r1 => "brainpoolP512r1",
            NamedGroup::X25519 => "x25519",
            NamedGroup::X448 => "x448",
            NamedGroup::BrainpoolP256r1Tls13 => "brainpoolP256r1tls13",
            NamedGroup::BrainpoolP384r1Tls13 => "brainpoolP384r1tls13",
            NamedGroup::BrainpoolP512r1Tls13 => "brainpoolP512r1tls13",
            NamedGroup::Ffdhe2048 => "ffdhe2048",
            NamedGroup::Ffdhe3072 => "ffdhe3072",
            NamedGroup::Ffdhe4096 => "ffdhe4096",
            NamedGroup::Unknown(_) => return None,
        };

        Some(name)
    }

    /// Look up a group by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN
            .into_iter()
            .find(|group| group.name() == Some(name))
    }

    /// Finite-field Diffie-Hellman group?
    pub fn is_dh(self) -> bool {
        matches!(
            self,
            NamedGroup::Ffdhe2048 | NamedGroup::Ffdhe3072 | NamedGroup::Ffdhe4096
        )
    }

    /// Elliptic curve group on a short Weierstrass curve?
    pub fn is_ecdh(self) -> bool {
        self.curve().is_some()
    }

    /// X25519?
    pub fn is_x25519(self) -> bool {
        self == NamedGroup::X25519
    }

    /// Curve behind an elliptic curve group.
    pub fn curve(self) -> Option<NamedCurve> {
        match self {
            NamedGroup::Secp256r1 => Some(NamedCurve::Secp256r1),
            NamedGroup::Secp384r1 => Some(NamedCurve::Secp384r1),
            NamedGroup::Secp521r1 => Some(NamedCurve::Secp521r1),
            NamedGroup::BrainpoolP256r1 | NamedGroup::BrainpoolP256r1Tls13 => {
                Some(NamedCurve::BrainpoolP256r1)
            }
            NamedGroup::BrainpoolP384r1 | NamedGroup::BrainpoolP384r1Tls13 => {
                Some(NamedCurve::BrainpoolP384r1)
            }
            NamedGroup::BrainpoolP512r1 | NamedGroup::BrainpoolP512r1Tls13 => {
                Some(NamedCurve::BrainpoolP512r1)
            }
            _ => None,
        }
    }

    /// Parameters of a finite-field group.
    pub fn dh_group(self) -> Option<DhGroup> {
        match self {
            NamedGroup::Ffdhe2048 => Some(DhGroup::ffdhe2048()),
            NamedGroup::Ffdhe3072 => Some(DhGroup::ffdhe3072()),
            NamedGroup::Ffdhe4096 => Some(DhGroup::ffdhe4096()),
            _ => None,
        }
    }
}

impl From<u16> for NamedGroup {
    fn from(code: u16) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|group| group.code() == code)
            .unwrap_or(NamedGroup::Unknown(code))
    }
}

impl From<NamedGroup> for u16 {
    fn from(group: NamedGroup) -> u16 {
        group.code()
    }
}

impl TryFrom<String> for NamedGroup {
    type Error = String;

    fn try_from(name: String) -> Result<Self, String> {
        Self::from_name(&name).ok_or_else(|| format!("unknown TLS group {name:?}"))
    }
}

impl fmt::Display for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown group {:#06x}", self.code()),
        }
    }
}

/// Group a key exchange runs over: a registered group, or explicit
/// finite-field parameters as offered in a TLS 1.2 `ServerKeyExchange`.
///
/// Which selectors are legal for a given protocol version is decided by the
/// caller; the key exchange routes every selector the same way.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupSelector {
    /// Registered group.
    Named(NamedGroup),
    /// Explicit Diffie-Hellman parameters.
    Explicit(DhGroup),
}

impl GroupSelector {
    /// Finite-field parameters, when this selector names a DH group.
    pub fn dh_group(&self) -> Option<DhGroup> {
        match self {
            GroupSelector::Named(group) => group.dh_group(),
            GroupSelector::Explicit(group) => Some(group.clone()),
        }
    }

    /// The registered group, if any.
    pub fn named(&self) -> Option<NamedGroup> {
        match self {
            GroupSelector::Named(group) => Some(*group),
            GroupSelector::Explicit(_) => None,
        }
    }
}

impl From<NamedGroup> for GroupSelector {
    fn from(group: NamedGroup) -> Self {
        GroupSelector::Named(group)
    }
}

impl From<DhGroup> for GroupSelector {
    fn from(group: DhGroup) -> Self {
        GroupSelector::Explicit(group)
    }
}

#[cfg(test)]
mod tests {
    use super::NamedGroup;

    #[test]
    fn codes_round_trip() {
        for group in NamedGroup::KNOWN {
            assert_eq!(NamedGroup::from(group.code()), group);
            assert_eq!(NamedGroup::from_name(group.name().unwrap()), Some(group));
        }

        assert_eq!(NamedGroup::from(0x1234), NamedGroup::Unknown(0x1234));
        assert_eq!(NamedGroup::Unknown(0x1234).to_string(), "unknown group 0x1234");
    }

    #[test]
    fn families_are_disjoint() {
        for group in NamedGroup::KNOWN {
            let families = [group.is_dh(), group.is_ecdh(), group.is_x25519()];
            assert!(families.iter().filter(|f| **f).count() <= 1, "{group}");
        }

        assert!(!NamedGroup::X448.is_ecdh());
        assert!(NamedGroup::BrainpoolP384r1Tls13.is_ecdh());
    }
}
