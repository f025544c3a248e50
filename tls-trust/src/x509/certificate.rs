//! Certificates as already-parsed, validated structures.

use crate::{
    Error, Result,
    signature::{DigestScheme, SignatureFormat, Signer, Verifier},
};
use der::{
    Encode, Sequence,
    asn1::{BitString, GeneralizedTime, ObjectIdentifier},
};
use ecc_key::{AlgorithmIdentifier, EcPrivateKey, EcPublicKey};
use rand_core::CryptoRngCore;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fields of a certificate to be issued.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateParams {
    /// Subject name.
    pub subject: String,
    /// Serial number, unique per issuer.
    pub serial: u64,
    /// Start of the validity window.
    pub not_before: SystemTime,
    /// End of the validity window.
    pub not_after: SystemTime,
    /// May this certificate issue others?
    pub is_ca: bool,
    /// DNS names the certificate is valid for.
    pub dns_names: Vec<String>,
    /// Digest the issuer signs with.
    pub digest: DigestScheme,
}

/// An X.509-style certificate binding a subject name to an EC public key.
///
/// The signature covers a deterministic DER encoding of every other field,
/// see [`Certificate::tbs_der`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Certificate {
    subject: String,
    issuer: String,
    serial: u64,
    not_before: SystemTime,
    not_after: SystemTime,
    public_key: EcPublicKey,
    is_ca: bool,
    dns_names: Vec<String>,
    signature_digest: DigestScheme,
    signature: Vec<u8>,
}

impl Certificate {
    /// Issue a certificate for `subject_key`, signed by `issuer_key` in the
    /// name of `issuer`.
    pub fn issue(
        params: CertificateParams,
        subject_key: EcPublicKey,
        issuer: &str,
        issuer_key: &EcPrivateKey,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        if params.not_after < params.not_before {
            return Err(Error::InvalidArgument(
                "certificate validity window is empty".into(),
            ));
        }

        let mut cert = Self {
            subject: params.subject,
            issuer: issuer.to_owned(),
            serial: params.serial,
            not_before: params.not_before,
            not_after: params.not_after,
            public_key: subject_key,
            is_ca: params.is_ca,
            dns_names: params.dns_names,
            signature_digest: params.digest,
            signature: Vec::new(),
        };

        let signer =
            Signer::from_private_key(issuer_key, cert.signature_digest, SignatureFormat::DerSequence)?;
        cert.signature = signer.sign_message(rng, &cert.tbs_der()?)?;

        Ok(cert)
    }

    /// Issue a certificate signed by its own key.
    pub fn self_signed(
        params: CertificateParams,
        key: &EcPrivateKey,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        let issuer = params.subject.clone();
        Self::issue(params, key.public_key().clone(), &issuer, key, rng)
    }

    /// Subject name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer name.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Start of the validity window.
    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    /// End of the validity window.
    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Subject public key.
    pub fn public_key(&self) -> &EcPublicKey {
        &self.public_key
    }

    /// May this certificate issue others?
    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// DNS names.
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    /// Digest used by the issuer's signature.
    pub fn signature_digest(&self) -> DigestScheme {
        self.signature_digest
    }

    /// DER encoded ECDSA signature.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Subject and issuer are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// DER encoding of the signed fields.
    pub fn tbs_der(&self) -> Result<Vec<u8>> {
        let tbs = TbsCertificate {
            serial: self.serial,
            signature_algorithm: self.signature_digest.ecdsa_oid(),
            issuer: self.issuer.clone(),
            not_before: generalized_time(self.not_before)?,
            not_after: generalized_time(self.not_after)?,
            subject: self.subject.clone(),
            subject_algorithm: self.public_key.algorithm_identifier()?,
            subject_public_key: BitString::from_bytes(&self.public_key.x509_public_bytes())?,
            is_ca: self.is_ca,
            dns_names: self.dns_names.clone(),
        };

        Ok(tbs.to_der()?)
    }

    /// Check the signature against the issuer's key.
    ///
    /// Fails with [`Error::InvalidArgument`] when the signature digest is
    /// too weak for the issuer key.
    pub fn check_signature(&self, issuer_key: &EcPublicKey) -> Result<bool> {
        let verifier =
            Verifier::new(issuer_key, self.signature_digest, SignatureFormat::DerSequence)?;
        Ok(verifier.verify_message(&self.tbs_der()?, &self.signature))
    }

    /// Security level of the issuer's signature: the weaker of the issuer
    /// key and the digest.
    pub fn signature_strength(&self, issuer_key: &EcPublicKey) -> usize {
        issuer_key
            .estimated_strength()
            .min(self.signature_digest.strength())
    }

    /// Is `now` inside the validity window?
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Does `hostname` match one of the DNS names (or the subject when
    /// there are none)? A `*` is honored as the whole left-most label only.
    pub fn matches_dns_name(&self, hostname: &str) -> bool {
        let hostname = hostname.strip_suffix('.').unwrap_or(hostname);

        if hostname.is_empty() {
            return false;
        }

        if self.dns_names.is_empty() {
            return dns_name_matches(&self.subject, hostname);
        }

        self.dns_names
            .iter()
            .any(|pattern| dns_name_matches(pattern, hostname))
    }
}

fn dns_name_matches(pattern: &str, hostname: &str) -> bool {
    if pattern.eq_ignore_ascii_case(hostname) {
        return true;
    }

    let Some(suffix) = pattern.strip_prefix("*.") else {
        return false;
    };

    if suffix.contains('*') || !suffix.contains('.') {
        return false;
    }

    match hostname.split_once('.') {
        Some((label, rest)) => !label.is_empty() && rest.eq_ignore_ascii_case(suffix),
        None => false,
    }
}

pub(crate) fn generalized_time(time: SystemTime) -> Result<GeneralizedTime> {
    let since_epoch = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| Error::InvalidArgument("time is before the Unix epoch".into()))?;

    Ok(GeneralizedTime::from_unix_duration(Duration::from_secs(
        since_epoch.as_secs(),
    ))?)
}

pub(crate) fn system_time(time: &GeneralizedTime) -> SystemTime {
    UNIX_EPOCH + time.to_unix_duration()
}

#[derive(Sequence)]
struct TbsCertificate {
    serial: u64,
    signature_algorithm: ObjectIdentifier,
    issuer: String,
    not_before: GeneralizedTime,
    not_after: GeneralizedTime,
    subject: String,
    subject_algorithm: AlgorithmIdentifier,
    subject_public_key: BitString,
    is_ca: bool,
    dns_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::dns_name_matches;

    #[test]
    fn exact_names() {
        assert!(dns_name_matches("www.example.com", "www.example.com"));
        assert!(dns_name_matches("WWW.Example.com", "www.example.COM"));
        assert!(!dns_name_matches("www.example.com", "example.com"));
    }

    #[test]
    fn wildcards() {
        assert!(dns_name_matches("*.example.com", "www.example.com"));
        assert!(!dns_name_matches("*.example.com", "a.b.example.com"));
        assert!(!dns_name_matches("*.example.com", "example.com"));
        assert!(!dns_name_matches("*.example.com", ".example.com"));
        assert!(!dns_name_matches("*.com", "example.com"));
        assert!(!dns_name_matches("www.*.com", "www.example.com"));
        assert!(!dns_name_matches("*.*.example.com", "a.b.example.com"));
    }
}
