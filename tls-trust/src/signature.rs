//! Signature bridge: one-shot ECDSA signing and verification of handshake
//! messages.

use crate::{Error, Result};
use der::asn1::ObjectIdentifier;
use ecc_key::{
    EcKey, EcPrivateKey, EcPublicKey,
    ecdsa::{self, Signature},
    registry,
};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Message digest applied before signing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DigestScheme {
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestScheme {
    /// Look up a scheme by name: `SHA-256`, or the padding-style
    /// `EMSA1(SHA-256)`.
    pub fn from_name(name: &str) -> Result<Self> {
        let hash = name
            .strip_prefix("EMSA1(")
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(name);

        match hash {
            "SHA-224" => Ok(DigestScheme::Sha224),
            "SHA-256" => Ok(DigestScheme::Sha256),
            "SHA-384" => Ok(DigestScheme::Sha384),
            "SHA-512" => Ok(DigestScheme::Sha512),
            _ => Err(Error::InvalidArgument(format!(
                "signature scheme {name} is not supported for ECDSA"
            ))),
        }
    }

    /// Hash function name.
    pub fn name(self) -> &'static str {
        match self {
            DigestScheme::Sha224 => "SHA-224",
            DigestScheme::Sha256 => "SHA-256",
            DigestScheme::Sha384 => "SHA-384",
            DigestScheme::Sha512 => "SHA-512",
        }
    }

    /// Digest size in bits.
    pub fn output_bits(self) -> usize {
        match self {
            DigestScheme::Sha224 => 224,
            DigestScheme::Sha256 => 256,
            DigestScheme::Sha384 => 384,
            DigestScheme::Sha512 => 512,
        }
    }

    /// Collision resistance in bits.
    pub fn strength(self) -> usize {
        self.output_bits() / 2
    }

    /// `ecdsa-with-SHA*` signature algorithm identifier.
    pub fn ecdsa_oid(self) -> ObjectIdentifier {
        match self {
            DigestScheme::Sha224 => registry::ECDSA_WITH_SHA224,
            DigestScheme::Sha256 => registry::ECDSA_WITH_SHA256,
            DigestScheme::Sha384 => registry::ECDSA_WITH_SHA384,
            DigestScheme::Sha512 => registry::ECDSA_WITH_SHA512,
        }
    }

    /// Scheme for an `ecdsa-with-SHA*` signature algorithm identifier.
    pub fn from_ecdsa_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [
            DigestScheme::Sha224,
            DigestScheme::Sha256,
            DigestScheme::Sha384,
            DigestScheme::Sha512,
        ]
        .into_iter()
        .find(|scheme| scheme.ecdsa_oid() == *oid)
    }

    /// Hash `msg`.
    pub fn digest(self, msg: &[u8]) -> Vec<u8> {
        match self {
            DigestScheme::Sha224 => Sha224::digest(msg).to_vec(),
            DigestScheme::Sha256 => Sha256::digest(msg).to_vec(),
            DigestScheme::Sha384 => Sha384::digest(msg).to_vec(),
            DigestScheme::Sha512 => Sha512::digest(msg).to_vec(),
        }
    }

    /// Is this digest long enough for a key whose group order has
    /// `order_bits` bits?
    fn suits(self, order_bits: usize) -> bool {
        let minimum = match order_bits {
            0..=256 => 160,
            257..=384 => 256,
            _ => 384,
        };

        self.output_bits() >= minimum
    }
}

/// Wire form of an ECDSA signature.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SignatureFormat {
    /// Fixed-width `r || s`.
    #[default]
    Ieee1363,
    /// DER `SEQUENCE { r INTEGER, s INTEGER }`.
    DerSequence,
}

fn check_combination(key: &EcPublicKey, scheme: DigestScheme) -> Result<()> {
    let order_bits = key.domain().order_bits();

    if !scheme.suits(order_bits) {
        return Err(Error::InvalidArgument(format!(
            "{} is too weak for a {order_bits} bit ECDSA key",
            scheme.name()
        )));
    }

    Ok(())
}

/// Signer bound to one private key, digest and format.
#[derive(Debug)]
pub struct Signer<'a> {
    key: &'a EcPrivateKey,
    scheme: DigestScheme,
    format: SignatureFormat,
}

impl<'a> Signer<'a> {
    /// Bind a signer, rejecting keys without a private half and digests too
    /// weak for the key.
    pub fn new(key: &'a EcKey, scheme: DigestScheme, format: SignatureFormat) -> Result<Self> {
        Self::from_private_key(key.private_key()?, scheme, format)
    }

    /// Bind a signer to a private key, rejecting digests too weak for it.
    pub fn from_private_key(
        key: &'a EcPrivateKey,
        scheme: DigestScheme,
        format: SignatureFormat,
    ) -> Result<Self> {
        check_combination(key.public_key(), scheme)?;

        Ok(Self {
            key,
            scheme,
            format,
        })
    }

    /// Sign `msg`.
    pub fn sign_message(&self, rng: &mut impl CryptoRngCore, msg: &[u8]) -> Result<Vec<u8>> {
        let digest = self.scheme.digest(msg);
        let signature = ecdsa::sign_prehash(self.key, rng, &digest)?;

        match self.format {
            SignatureFormat::Ieee1363 => Ok(signature.to_bytes(self.key.domain())),
            SignatureFormat::DerSequence => Ok(signature.to_der()?),
        }
    }
}

/// Verifier bound to one public key, digest and format.
#[derive(Debug)]
pub struct Verifier<'a> {
    key: &'a EcPublicKey,
    scheme: DigestScheme,
    format: SignatureFormat,
}

impl<'a> Verifier<'a> {
    /// Bind a verifier, rejecting digests too weak for the key.
    pub fn new(
        key: &'a EcPublicKey,
        scheme: DigestScheme,
        format: SignatureFormat,
    ) -> Result<Self> {
        check_combination(key, scheme)?;

        Ok(Self {
            key,
            scheme,
            format,
        })
    }

    /// Check `signature` over `msg`. Malformed signatures verify as
    /// `false`.
    pub fn verify_message(&self, msg: &[u8], signature: &[u8]) -> bool {
        let signature = match self.format {
            SignatureFormat::Ieee1363 => Signature::from_bytes(self.key.domain(), signature),
            SignatureFormat::DerSequence => Signature::from_der(signature),
        };

        match signature {
            Ok(signature) => {
                ecdsa::verify_prehash(self.key, &self.scheme.digest(msg), &signature)
            }
            Err(_) => false,
        }
    }
}

/// Sign `msg` with `key`.
pub fn sign(
    key: &EcKey,
    rng: &mut impl CryptoRngCore,
    scheme: DigestScheme,
    format: SignatureFormat,
    msg: &[u8],
) -> Result<Vec<u8>> {
    Signer::new(key, scheme, format)?.sign_message(rng, msg)
}

/// Verify `signature` over `msg` with `key`.
pub fn verify(
    key: &EcPublicKey,
    scheme: DigestScheme,
    format: SignatureFormat,
    msg: &[u8],
    signature: &[u8],
) -> Result<bool> {
    Ok(Verifier::new(key, scheme, format)?.verify_message(msg, signature))
}

#[cfg(test)]
mod tests {
    use super::DigestScheme;

    #[test]
    fn scheme_names() {
        assert_eq!(DigestScheme::from_name("SHA-384").unwrap(), DigestScheme::Sha384);
        assert_eq!(
            DigestScheme::from_name("EMSA1(SHA-256)").unwrap(),
            DigestScheme::Sha256
        );
        assert!(DigestScheme::from_name("SHA-1").is_err());
        assert!(DigestScheme::from_name("EMSA1(SHA-256").is_err());
    }

    #[test]
    fn weak_digests() {
        assert!(DigestScheme::Sha224.suits(256));
        assert!(!DigestScheme::Sha224.suits(384));
        assert!(DigestScheme::Sha256.suits(384));
        assert!(!DigestScheme::Sha256.suits(521));
        assert!(DigestScheme::Sha384.suits(521));
    }
}
