//! Handshake policy: which peer keys and certificates are acceptable.

use crate::{Alert, Error, NamedGroup, Result, dh::DhPublicKey};
use ecc_key::EcPublicKey;
use serde::Deserialize;
use std::{fs, path::Path};

/// A peer public key submitted for the policy's approval.
#[derive(Copy, Clone, Debug)]
pub enum PeerKey<'a> {
    /// Finite-field Diffie-Hellman key exchange value.
    Dh(&'a DhPublicKey),
    /// Elliptic curve key exchange point.
    Ecdh(&'a EcPublicKey),
    /// X25519 key exchange value.
    X25519,
    /// Certificate signing key.
    Ecdsa(&'a EcPublicKey),
}

impl PeerKey<'_> {
    /// Algorithm name, as used in error messages.
    pub fn algorithm(&self) -> &'static str {
        match self {
            PeerKey::Dh(_) => "DH",
            PeerKey::Ecdh(_) => "ECDH",
            PeerKey::X25519 => "X25519",
            PeerKey::Ecdsa(_) => "ECDSA",
        }
    }

    /// Key size in bits: the modulus or field size.
    pub fn key_length(&self) -> usize {
        match self {
            PeerKey::Dh(key) => key.key_length(),
            PeerKey::Ecdh(key) | PeerKey::Ecdsa(key) => key.key_length(),
            PeerKey::X25519 => 255,
        }
    }
}

/// Acceptability rules applied during the handshake.
///
/// Every method has a default, so implementors override only what they
/// need to tighten or relax.
pub trait Policy {
    /// Must every certificate below the trust anchor come with revocation
    /// evidence?
    fn require_cert_revocation_info(&self) -> bool {
        false
    }

    /// Minimum security level, in bits, of certificate signatures.
    fn minimum_signature_strength(&self) -> usize {
        110
    }

    /// Minimum modulus size of a peer's DH group.
    fn minimum_dh_group_size(&self) -> usize {
        2048
    }

    /// Minimum field size of a peer's ECDH or X25519 key.
    fn minimum_ecdh_group_size(&self) -> usize {
        255
    }

    /// Minimum field size of a peer's ECDSA key.
    fn minimum_ecdsa_group_size(&self) -> usize {
        256
    }

    /// May key exchange run over `group`?
    fn allowed_group(&self, group: NamedGroup) -> bool {
        group.name().is_some()
    }

    /// Reject peer keys below the configured minimum sizes with an
    /// `insufficient_security` alert.
    fn check_peer_key_acceptable(&self, key: &PeerKey<'_>) -> Result<()> {
        let minimum = match key {
            PeerKey::Dh(_) => self.minimum_dh_group_size(),
            PeerKey::Ecdh(_) | PeerKey::X25519 => self.minimum_ecdh_group_size(),
            PeerKey::Ecdsa(_) => self.minimum_ecdsa_group_size(),
        };

        let length = key.key_length();

        if length < minimum {
            tracing::warn!(
                algorithm = key.algorithm(),
                length,
                minimum,
                "peer key below policy minimum"
            );
            return Err(Error::tls(
                Alert::InsufficientSecurity,
                format!(
                    "peer sent {length} bit {} key but policy requires at least {minimum}",
                    key.algorithm()
                ),
            ));
        }

        Ok(())
    }
}

/// Policy with every default.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultPolicy;

impl Policy for DefaultPolicy {}

/// Policy loaded from TOML.
///
/// ```toml
/// require_revocation_info = true
/// minimum_signature_strength = 128
/// allowed_groups = ["x25519", "secp256r1", "ffdhe3072"]
/// ```
///
/// Omitted keys keep the [`Policy`] defaults.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// See [`Policy::require_cert_revocation_info`].
    pub require_revocation_info: bool,
    /// See [`Policy::minimum_signature_strength`].
    pub minimum_signature_strength: usize,
    /// See [`Policy::minimum_dh_group_size`].
    pub minimum_dh_group_size: usize,
    /// See [`Policy::minimum_ecdh_group_size`].
    pub minimum_ecdh_group_size: usize,
    /// See [`Policy::minimum_ecdsa_group_size`].
    pub minimum_ecdsa_group_size: usize,
    /// Groups key exchange may use.
    pub allowed_groups: Vec<NamedGroup>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            require_revocation_info: DefaultPolicy.require_cert_revocation_info(),
            minimum_signature_strength: DefaultPolicy.minimum_signature_strength(),
            minimum_dh_group_size: DefaultPolicy.minimum_dh_group_size(),
            minimum_ecdh_group_size: DefaultPolicy.minimum_ecdh_group_size(),
            minimum_ecdsa_group_size: DefaultPolicy.minimum_ecdsa_group_size(),
            allowed_groups: NamedGroup::KNOWN.to_vec(),
        }
    }
}

impl PolicyConfig {
    /// Parse and validate a TOML policy.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;

        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded TLS policy");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.minimum_signature_strength == 0 {
            return Err(Error::InvalidArgument(
                "minimum_signature_strength must be positive".into(),
            ));
        }

        if self.allowed_groups.is_empty() {
            return Err(Error::InvalidArgument(
                "allowed_groups must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl Policy for PolicyConfig {
    fn require_cert_revocation_info(&self) -> bool {
        self.require_revocation_info
    }

    fn minimum_signature_strength(&self) -> usize {
        self.minimum_signature_strength
    }

    fn minimum_dh_group_size(&self) -> usize {
        self.minimum_dh_group_size
    }

    fn minimum_ecdh_group_size(&self) -> usize {
        self.minimum_ecdh_group_size
    }

    fn minimum_ecdsa_group_size(&self) -> usize {
        self.minimum_ecdsa_group_size
    }

    fn allowed_group(&self, group: NamedGroup) -> bool {
        self.allowed_groups.contains(&group)
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultPolicy, Policy, PolicyConfig};
    use crate::{Error, NamedGroup};

    #[test]
    fn empty_document_keeps_defaults() {
        let config = PolicyConfig::from_toml_str("").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert_eq!(config.minimum_signature_strength(), 110);
        assert!(config.allowed_group(NamedGroup::X25519));
        assert!(!DefaultPolicy.allowed_group(NamedGroup::Unknown(0xfe00)));
    }

    #[test]
    fn rejects_unknown_keys_and_groups() {
        assert!(matches!(
            PolicyConfig::from_toml_str("minimum_rsa_size = 2048"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PolicyConfig::from_toml_str(r#"allowed_groups = ["secp1r1"]"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            PolicyConfig::from_toml_str("minimum_signature_strength = 0"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            PolicyConfig::from_toml_str("allowed_groups = []"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
