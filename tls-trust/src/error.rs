//! Error types.

use core::fmt;

/// Result type with the `tls-trust` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// TLS alert descriptions raised by this crate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Alert {
    /// `handshake_failure`
    HandshakeFailure,
    /// `bad_certificate`
    BadCertificate,
    /// `illegal_parameter`
    IllegalParameter,
    /// `decode_error`
    DecodeError,
    /// `insufficient_security`
    InsufficientSecurity,
    /// `internal_error`
    InternalError,
}

impl Alert {
    /// Wire code of the alert description.
    pub fn code(self) -> u8 {
        match self {
            Alert::HandshakeFailure => 40,
            Alert::BadCertificate => 42,
            Alert::IllegalParameter => 47,
            Alert::DecodeError => 50,
            Alert::InsufficientSecurity => 71,
            Alert::InternalError => 80,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alert::HandshakeFailure => "handshake_failure",
            Alert::BadCertificate => "bad_certificate",
            Alert::IllegalParameter => "illegal_parameter",
            Alert::DecodeError => "decode_error",
            Alert::InsufficientSecurity => "insufficient_security",
            Alert::InternalError => "internal_error",
        })
    }
}

/// Trust core errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Handshake-fatal failure, to be reported to the peer with `alert`.
    #[error("{alert}: {message}")]
    Tls {
        /// Alert to send.
        alert: Alert,
        /// Human readable reason.
        message: String,
    },

    /// The caller broke an API contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Policy configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Key or encoding error from `ecc-key`.
    #[error(transparent)]
    Key(#[from] ecc_key::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Caller misuse or bad configuration.
    InvalidArgument,
    /// Malformed bytes from the peer.
    Decoding,
    /// Well-formed peer value that is cryptographically unacceptable.
    IllegalParameter,
    /// The peer's credentials or parameters were refused.
    Rejected,
    /// Implementation defect.
    Internal,
}

impl Error {
    pub(crate) fn tls(alert: Alert, message: impl Into<String>) -> Self {
        Error::Tls {
            alert,
            message: message.into(),
        }
    }

    /// Alert to send to the peer, if this error is handshake-fatal.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            Error::Tls { alert, .. } => Some(*alert),
            _ => None,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Tls { alert, .. } => match alert {
                Alert::DecodeError => ErrorKind::Decoding,
                Alert::IllegalParameter => ErrorKind::IllegalParameter,
                Alert::HandshakeFailure | Alert::BadCertificate | Alert::InsufficientSecurity => {
                    ErrorKind::Rejected
                }
                Alert::InternalError => ErrorKind::Internal,
            },
            Error::InvalidArgument(_) | Error::Config(_) => ErrorKind::InvalidArgument,
            Error::Key(err) => match err.kind() {
                ecc_key::ErrorKind::InvalidArgument => ErrorKind::InvalidArgument,
                ecc_key::ErrorKind::Decoding => ErrorKind::Decoding,
                ecc_key::ErrorKind::InvalidPoint => ErrorKind::IllegalParameter,
                ecc_key::ErrorKind::Internal => ErrorKind::Internal,
            },
        }
    }

    /// Map a key error raised while processing a peer's value onto the alert
    /// it warrants. Other errors pass through unchanged.
    pub(crate) fn from_peer_value(err: ecc_key::Error) -> Self {
        match err {
            ecc_key::Error::Decoding(message) => Error::tls(Alert::DecodeError, message),
            ecc_key::Error::InvalidPoint(message) => Error::tls(Alert::IllegalParameter, message),
            other => Error::Key(other),
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Key(err.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Error {
        Error::Config(err.to_string())
    }
}
