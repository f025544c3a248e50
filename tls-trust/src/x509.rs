//! Certificate chain validation for the handshake.

mod certificate;
pub mod ocsp;
mod path;
mod store;

pub use self::{
    certificate::{Certificate, CertificateParams},
    ocsp::{CertStatus, OcspResponse, SingleResponse},
    path::{FailureReason, MAX_PATH_LENGTH, PathValidationResult, Restrictions, validate_path},
    store::{CertificateStore, InMemoryStore},
};

use crate::{
    Alert, Error, Result,
    clock::TimeSource,
    policy::{PeerKey, Policy},
};

/// What the peer's certificate is trusted for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Usage {
    /// The peer is a server; its name is checked.
    ServerAuth,
    /// The peer is a client.
    ClientAuth,
    /// No particular purpose.
    #[default]
    Unspecified,
}

/// Decide whether the peer's `chain` (leaf first) is trustworthy.
///
/// `hostname` is matched against the leaf only for [`Usage::ServerAuth`].
/// A chain that fails validation is reported as a `bad_certificate` alert
/// naming the failure; a valid chain whose leaf key is too small for the
/// policy is an `insufficient_security` alert.
pub fn verify_cert_chain(
    chain: &[Certificate],
    ocsp: &[OcspResponse],
    trusted_roots: &[&dyn CertificateStore],
    usage: Usage,
    hostname: Option<&str>,
    policy: &dyn Policy,
    clock: &dyn TimeSource,
) -> Result<()> {
    let Some(leaf) = chain.first() else {
        return Err(Error::InvalidArgument(
            "certificate chain was empty".into(),
        ));
    };

    let restrictions = Restrictions::new(
        policy.require_cert_revocation_info(),
        policy.minimum_signature_strength(),
    );

    let hostname = match usage {
        Usage::ServerAuth => hostname,
        Usage::ClientAuth | Usage::Unspecified => None,
    };

    let result = validate_path(
        chain,
        &restrictions,
        trusted_roots,
        hostname,
        clock.now(),
        ocsp,
    );

    if let Some(reason) = result.failure_reason() {
        tracing::warn!(
            subject = leaf.subject(),
            %reason,
            "rejected certificate chain"
        );
        return Err(Error::tls(
            Alert::BadCertificate,
            format!("Certificate validation failure: {}", result.result_string()),
        ));
    }

    policy.check_peer_key_acceptable(&PeerKey::Ecdsa(leaf.public_key()))?;

    tracing::debug!(
        subject = leaf.subject(),
        path_length = result.cert_path().len(),
        "certificate chain verified"
    );
    Ok(())
}

/// Decode a raw OCSP response, treating malformed input as no evidence.
pub fn parse_ocsp_response(raw: &[u8]) -> Option<OcspResponse> {
    match OcspResponse::from_der(raw) {
        Ok(response) => Some(response),
        Err(err) => {
            tracing::warn!(%err, len = raw.len(), "discarding malformed OCSP response");
            None
        }
    }
}
