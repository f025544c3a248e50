//! OCSP revocation evidence.
//!
//! A response is `SEQUENCE { status INTEGER, [0] BasicResponse OPTIONAL }`
//! where the basic response carries the responder name, production time
//! and per-certificate statuses, signed with ECDSA by the issuing CA.

use super::{
    Certificate,
    certificate::{generalized_time, system_time},
};
use crate::{
    Error, Result,
    signature::{DigestScheme, SignatureFormat, Signer, Verifier},
};
use der::{
    Decode, Encode, Sequence,
    asn1::{GeneralizedTime, ObjectIdentifier, OctetString},
};
use ecc_key::EcPrivateKey;
use rand_core::CryptoRngCore;
use std::time::SystemTime;

/// Outcome reported in the outer response envelope.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResponseStatus {
    /// A basic response follows.
    Successful,
    /// The request was not understood.
    MalformedRequest,
    /// The responder failed internally.
    InternalError,
    /// The responder cannot answer yet.
    TryLater,
    /// The responder wants a signed request.
    SigRequired,
    /// The client may not query this responder.
    Unauthorized,
}

impl ResponseStatus {
    fn code(self) -> u8 {
        match self {
            ResponseStatus::Successful => 0,
            ResponseStatus::MalformedRequest => 1,
            ResponseStatus::InternalError => 2,
            ResponseStatus::TryLater => 3,
            ResponseStatus::SigRequired => 5,
            ResponseStatus::Unauthorized => 6,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ResponseStatus::Successful),
            1 => Ok(ResponseStatus::MalformedRequest),
            2 => Ok(ResponseStatus::InternalError),
            3 => Ok(ResponseStatus::TryLater),
            5 => Ok(ResponseStatus::SigRequired),
            6 => Ok(ResponseStatus::Unauthorized),
            _ => Err(malformed(format!("unknown OCSP response status {code}"))),
        }
    }
}

/// Revocation status of one certificate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CertStatus {
    /// Not revoked.
    Good,
    /// Revoked.
    Revoked,
    /// The responder does not know the certificate.
    Unknown,
}

impl CertStatus {
    fn code(self) -> u8 {
        match self {
            CertStatus::Good => 0,
            CertStatus::Revoked => 1,
            CertStatus::Unknown => 2,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(CertStatus::Good),
            1 => Ok(CertStatus::Revoked),
            2 => Ok(CertStatus::Unknown),
            _ => Err(malformed(format!("unknown OCSP certificate status {code}"))),
        }
    }
}

/// Status of a single certificate, identified by issuer name and serial.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SingleResponse {
    /// Issuer of the certificate.
    pub issuer: String,
    /// Serial number of the certificate.
    pub serial: u64,
    /// Status.
    pub status: CertStatus,
    /// When the status was known to be correct.
    pub this_update: SystemTime,
    /// When newer information will be available.
    pub next_update: Option<SystemTime>,
}

impl SingleResponse {
    /// Response about `cert`.
    pub fn for_certificate(
        cert: &Certificate,
        status: CertStatus,
        this_update: SystemTime,
        next_update: Option<SystemTime>,
    ) -> Self {
        Self {
            issuer: cert.issuer().to_owned(),
            serial: cert.serial(),
            status,
            this_update,
            next_update,
        }
    }

    /// Does this response describe `cert`?
    pub fn matches(&self, cert: &Certificate) -> bool {
        self.issuer == cert.issuer() && self.serial == cert.serial()
    }

    /// Is the information current at `now`?
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        self.this_update <= now && self.next_update.is_none_or(|next| now <= next)
    }
}

/// Decoded OCSP response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspResponse {
    status: ResponseStatus,
    basic: Option<BasicResponse>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct BasicResponse {
    responder: String,
    produced_at: SystemTime,
    responses: Vec<SingleResponse>,
    digest: DigestScheme,
    signature: Vec<u8>,
    tbs: Vec<u8>,
}

impl OcspResponse {
    /// Build a successful response signed by `responder_key` in the name of
    /// `responder`.
    pub fn sign(
        responder: &str,
        responder_key: &EcPrivateKey,
        produced_at: SystemTime,
        responses: Vec<SingleResponse>,
        digest: DigestScheme,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        let tbs = ResponseData {
            responder: responder.to_owned(),
            produced_at: generalized_time(produced_at)?,
            responses: responses
                .iter()
                .map(SingleResponseDer::from_response)
                .collect::<Result<_>>()?,
        }
        .to_der()?;

        let signer = Signer::from_private_key(responder_key, digest, SignatureFormat::DerSequence)?;
        let signature = signer.sign_message(rng, &tbs)?;

        Ok(Self {
            status: ResponseStatus::Successful,
            basic: Some(BasicResponse {
                responder: responder.to_owned(),
                produced_at,
                responses,
                digest,
                signature,
                tbs,
            }),
        })
    }

    /// Unsuccessful response carrying only a status.
    pub fn unsuccessful(status: ResponseStatus) -> Result<Self> {
        if status == ResponseStatus::Successful {
            return Err(Error::InvalidArgument(
                "a successful OCSP response needs a basic response".into(),
            ));
        }

        Ok(Self {
            status,
            basic: None,
        })
    }

    /// Decode a DER response.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let envelope = ResponseEnvelope::from_der(bytes)?;
        let status = ResponseStatus::from_code(envelope.status)?;

        let basic = match (status, envelope.basic) {
            (ResponseStatus::Successful, Some(basic)) => Some(basic.into_basic()?),
            (ResponseStatus::Successful, None) => {
                return Err(malformed("successful OCSP response has no body"));
            }
            (_, Some(_)) => return Err(malformed("unsuccessful OCSP response has a body")),
            (_, None) => None,
        };

        Ok(Self { status, basic })
    }

    /// DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let basic = match &self.basic {
            Some(basic) => Some(BasicResponseDer {
                tbs: ResponseData::from_der(&basic.tbs)?,
                signature_algorithm: basic.digest.ecdsa_oid(),
                signature: OctetString::new(basic.signature.clone())?,
            }),
            None => None,
        };

        let envelope = ResponseEnvelope {
            status: self.status.code(),
            basic,
        };

        Ok(envelope.to_der()?)
    }

    /// Envelope status.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Did the responder answer?
    pub fn is_successful(&self) -> bool {
        self.status == ResponseStatus::Successful && self.basic.is_some()
    }

    /// Responder name, for successful responses.
    pub fn responder(&self) -> Option<&str> {
        self.basic.as_ref().map(|basic| basic.responder.as_str())
    }

    /// Production time, for successful responses.
    pub fn produced_at(&self) -> Option<SystemTime> {
        self.basic.as_ref().map(|basic| basic.produced_at)
    }

    /// Per-certificate statuses.
    pub fn responses(&self) -> &[SingleResponse] {
        self.basic
            .as_ref()
            .map(|basic| basic.responses.as_slice())
            .unwrap_or_default()
    }

    /// Was this response signed by `issuer`'s key, in `issuer`'s name?
    ///
    /// Unsuccessful responses and digests too weak for the key do not
    /// verify.
    pub fn verify_signature(&self, issuer: &Certificate) -> bool {
        let Some(basic) = &self.basic else {
            return false;
        };

        if basic.responder != issuer.subject() {
            return false;
        }

        match Verifier::new(issuer.public_key(), basic.digest, SignatureFormat::DerSequence) {
            Ok(verifier) => verifier.verify_message(&basic.tbs, &basic.signature),
            Err(_) => false,
        }
    }

    /// Status reported for `cert`, if any.
    pub fn status_for(&self, cert: &Certificate) -> Option<&SingleResponse> {
        self.responses()
            .iter()
            .find(|response| response.matches(cert))
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::Key(ecc_key::Error::Decoding(message.into()))
}

#[derive(Sequence)]
struct ResponseEnvelope {
    status: u8,
    #[asn1(context_specific = "0", optional = "true")]
    basic: Option<BasicResponseDer>,
}

#[derive(Sequence)]
struct BasicResponseDer {
    tbs: ResponseData,
    signature_algorithm: ObjectIdentifier,
    signature: OctetString,
}

impl BasicResponseDer {
    fn into_basic(self) -> Result<BasicResponse> {
        let digest = DigestScheme::from_ecdsa_oid(&self.signature_algorithm).ok_or_else(|| {
            malformed(format!(
                "unsupported OCSP signature algorithm {}",
                self.signature_algorithm
            ))
        })?;

        let responses = self
            .tbs
            .responses
            .iter()
            .map(SingleResponseDer::to_response)
            .collect::<Result<_>>()?;

        Ok(BasicResponse {
            responder: self.tbs.responder.clone(),
            produced_at: system_time(&self.tbs.produced_at),
            responses,
            digest,
            signature: self.signature.as_bytes().to_vec(),
            tbs: self.tbs.to_der()?,
        })
    }
}

#[derive(Sequence)]
struct ResponseData {
    responder: String,
    produced_at: GeneralizedTime,
    responses: Vec<SingleResponseDer>,
}

#[derive(Sequence)]
struct SingleResponseDer {
    issuer: String,
    serial: u64,
    status: u8,
    this_update: GeneralizedTime,
    #[asn1(context_specific = "0", optional = "true")]
    next_update: Option<GeneralizedTime>,
}

impl SingleResponseDer {
    fn from_response(response: &SingleResponse) -> Result<Self> {
        Ok(Self {
            issuer: response.issuer.clone(),
            serial: response.serial,
            status: response.status.code(),
            this_update: generalized_time(response.this_update)?,
            next_update: response.next_update.map(generalized_time).transpose()?,
        })
    }

    fn to_response(&self) -> Result<SingleResponse> {
        Ok(SingleResponse {
            issuer: self.issuer.clone(),
            serial: self.serial,
            status: CertStatus::from_code(self.status)?,
            this_update: system_time(&self.this_update),
            next_update: self.next_update.as_ref().map(system_time),
        })
    }
}
