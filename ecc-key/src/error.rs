//! Error type

/// Result type with the `ecc-key` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Elliptic curve key errors.
///
/// Malformed bytes ([`Error::Decoding`]) are kept apart from well-formed
/// bytes which describe an unacceptable value ([`Error::InvalidPoint`]).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The caller broke an API contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Structurally malformed input.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Well-formed input describing a point or key that fails validation.
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    /// The object was asked for a component it does not carry.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An invariant the implementation guarantees did not hold.
    #[error("internal error: {0}")]
    Internal(String),

    /// No identifier registered under the given name or OID.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
}

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Caller misuse, including asking for a missing key component.
    InvalidArgument,
    /// Malformed encoding from an untrusted source.
    Decoding,
    /// Cryptographically unacceptable value.
    InvalidPoint,
    /// Implementation defect.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) | Error::InvalidState(_) => ErrorKind::InvalidArgument,
            Error::Decoding(_) | Error::UnknownIdentifier(_) => ErrorKind::Decoding,
            Error::InvalidPoint(_) => ErrorKind::InvalidPoint,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn decoding(msg: impl Into<String>) -> Self {
        Error::Decoding(msg.into())
    }

    pub(crate) fn invalid_point(msg: impl Into<String>) -> Self {
        Error::InvalidPoint(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Decoding(err.to_string())
    }
}
