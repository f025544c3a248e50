//! Certificate path validation.

use super::{
    Certificate, CertificateStore,
    ocsp::{CertStatus, OcspResponse},
};
use core::fmt;
use std::{sync::Arc, time::SystemTime};

/// Longest path, anchor included, that will be built.
pub const MAX_PATH_LENGTH: usize = 16;

/// Why a path failed to validate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FailureReason {
    /// A certificate's validity window ended before `now`.
    Expired,
    /// A certificate's validity window starts after `now`.
    NotYetValid,
    /// No trust anchor issued the path.
    UntrustedIssuer,
    /// Revocation evidence reports a certificate as revoked.
    Revoked,
    /// A signature did not verify.
    BadSignature,
    /// The leaf does not cover the expected host name.
    NameMismatch,
    /// The path breaks a structural or strength rule.
    PolicyViolation,
    /// Revocation evidence is required but missing.
    NoRevocationData,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::Expired => "Certificate has expired",
            FailureReason::NotYetValid => "Certificate is not yet valid",
            FailureReason::UntrustedIssuer => "Certificate issuer not found",
            FailureReason::Revoked => "Certificate is revoked",
            FailureReason::BadSignature => "Signature error",
            FailureReason::NameMismatch => "Certificate does not match provided name",
            FailureReason::PolicyViolation => "Certificate violates policy",
            FailureReason::NoRevocationData => "No revocation data",
        })
    }
}

/// Constraints applied while validating a path.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Restrictions {
    require_revocation_information: bool,
    minimum_key_strength: usize,
}

impl Restrictions {
    /// Restrictions with mandatory revocation evidence for every certificate
    /// below the anchor when `require_revocation_information` is set, and a
    /// floor on signature security in bits.
    pub fn new(require_revocation_information: bool, minimum_key_strength: usize) -> Self {
        Self {
            require_revocation_information,
            minimum_key_strength,
        }
    }

    /// Is revocation evidence mandatory?
    pub fn require_revocation_information(&self) -> bool {
        self.require_revocation_information
    }

    /// Minimum signature security level in bits.
    pub fn minimum_key_strength(&self) -> usize {
        self.minimum_key_strength
    }
}

impl Default for Restrictions {
    fn default() -> Self {
        Self::new(false, 110)
    }
}

/// Outcome of [`validate_path`].
#[derive(Clone, Debug)]
pub struct PathValidationResult {
    path: Vec<Arc<Certificate>>,
    failure: Option<FailureReason>,
}

impl PathValidationResult {
    fn failed(path: Vec<Arc<Certificate>>, reason: FailureReason) -> Self {
        Self {
            path,
            failure: Some(reason),
        }
    }

    /// Did the path validate?
    pub fn successful_validation(&self) -> bool {
        self.failure.is_none()
    }

    /// Why validation failed.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure
    }

    /// `"Verified"`, or the failure reason.
    pub fn result_string(&self) -> String {
        match self.failure {
            Some(reason) => reason.to_string(),
            None => "Verified".to_owned(),
        }
    }

    /// Certificates from the leaf up to the anchor, as far as the path could
    /// be built.
    pub fn cert_path(&self) -> &[Arc<Certificate>] {
        &self.path
    }

    /// The anchor that ends a successfully validated path.
    pub fn trust_root(&self) -> Option<&Certificate> {
        if self.successful_validation() {
            self.path.last().map(Arc::as_ref)
        } else {
            None
        }
    }
}

/// Validate `chain` (leaf first) against the anchors in `trusted`.
///
/// Revocation evidence is looked up among `ocsp` by issuer name and serial;
/// a response counts only when it is successful, signed by the issuer and
/// fresh at `now`. `hostname`, when given, must be covered by the leaf.
pub fn validate_path(
    chain: &[Certificate],
    restrictions: &Restrictions,
    trusted: &[&dyn CertificateStore],
    hostname: Option<&str>,
    now: SystemTime,
    ocsp: &[OcspResponse],
) -> PathValidationResult {
    let path = match build_path(chain, trusted) {
        Ok(path) => path,
        Err((path, reason)) => return PathValidationResult::failed(path, reason),
    };

    if let Err(reason) = check_path(&path, restrictions, now) {
        return PathValidationResult::failed(path, reason);
    }

    if let Err(reason) = check_revocation(&path, restrictions, now, ocsp) {
        return PathValidationResult::failed(path, reason);
    }

    if let Some(hostname) = hostname {
        if !path[0].matches_dns_name(hostname) {
            return PathValidationResult::failed(path, FailureReason::NameMismatch);
        }
    }

    PathValidationResult {
        path,
        failure: None,
    }
}

type BuildResult = Result<Vec<Arc<Certificate>>, (Vec<Arc<Certificate>>, FailureReason)>;

/// Follow issuer names from the leaf until a trusted certificate is reached.
fn build_path(chain: &[Certificate], trusted: &[&dyn CertificateStore]) -> BuildResult {
    let Some(leaf) = chain.first() else {
        return Err((Vec::new(), FailureReason::UntrustedIssuer));
    };

    let mut path = vec![Arc::new(leaf.clone())];

    loop {
        let current = Arc::clone(&path[path.len() - 1]);

        if trusted.iter().any(|store| store.contains(&current)) {
            return Ok(path);
        }

        if path.len() >= MAX_PATH_LENGTH {
            return Err((path, FailureReason::PolicyViolation));
        }

        if let Some(anchor) = find_anchor(&current, trusted) {
            path.push(anchor);
            return Ok(path);
        }

        if current.is_self_issued() {
            return Err((path, FailureReason::UntrustedIssuer));
        }

        let next = chain.iter().find(|candidate| {
            candidate.subject() == current.issuer()
                && !path.iter().any(|seen| seen.as_ref() == *candidate)
        });

        match next {
            Some(issuer) => path.push(Arc::new(issuer.clone())),
            None => return Err((path, FailureReason::UntrustedIssuer)),
        }
    }
}

/// Trusted issuer of `cert`, preferring one whose key verifies it.
fn find_anchor(cert: &Certificate, trusted: &[&dyn CertificateStore]) -> Option<Arc<Certificate>> {
    let candidates: Vec<_> = trusted
        .iter()
        .flat_map(|store| store.find_by_subject(cert.issuer()))
        .collect();

    let verified = candidates
        .iter()
        .find(|anchor| matches!(cert.check_signature(anchor.public_key()), Ok(true)));

    verified.or(candidates.first()).cloned()
}

fn check_path(
    path: &[Arc<Certificate>],
    restrictions: &Restrictions,
    now: SystemTime,
) -> Result<(), FailureReason> {
    for (i, cert) in path.iter().enumerate() {
        if now < cert.not_before() {
            return Err(FailureReason::NotYetValid);
        }

        if now > cert.not_after() {
            return Err(FailureReason::Expired);
        }

        // the anchor is trusted as-is
        let Some(issuer) = path.get(i + 1) else {
            break;
        };

        if !issuer.is_ca() {
            tracing::debug!(issuer = issuer.subject(), "issuer is not a CA");
            return Err(FailureReason::PolicyViolation);
        }

        match cert.check_signature(issuer.public_key()) {
            Ok(true) => {}
            Ok(false) => return Err(FailureReason::BadSignature),
            Err(err) => {
                tracing::debug!(%err, subject = cert.subject(), "unusable certificate signature");
                return Err(FailureReason::PolicyViolation);
            }
        }

        if cert.signature_strength(issuer.public_key()) < restrictions.minimum_key_strength() {
            return Err(FailureReason::PolicyViolation);
        }
    }

    Ok(())
}

fn check_revocation(
    path: &[Arc<Certificate>],
    restrictions: &Restrictions,
    now: SystemTime,
    ocsp: &[OcspResponse],
) -> Result<(), FailureReason> {
    for pair in path.windows(2) {
        let (cert, issuer) = (&pair[0], &pair[1]);

        let mut evidence = ocsp
            .iter()
            .filter(|response| response.is_successful() && response.verify_signature(issuer))
            .filter_map(|response| response.status_for(cert))
            .filter(|single| single.is_fresh(now) && single.status != CertStatus::Unknown)
            .peekable();

        if evidence.peek().is_none() {
            if restrictions.require_revocation_information() {
                return Err(FailureReason::NoRevocationData);
            }
            continue;
        }

        if evidence.any(|single| single.status == CertStatus::Revoked) {
            return Err(FailureReason::Revoked);
        }
    }

    Ok(())
}
