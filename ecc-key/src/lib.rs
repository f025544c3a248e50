#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Usage
//!
//! ```
//! use ecc_key::{EcPrivateKey, EcPublicKey, NamedCurve};
//! use rand_core::OsRng;
//!
//! let domain = NamedCurve::Secp256r1.domain()?;
//! let alice = EcPrivateKey::generate(domain.clone(), &mut OsRng)?;
//!
//! let alg_id = alice.public_key().algorithm_identifier()?;
//! let public = EcPublicKey::from_encoded(&alg_id, &alice.public_key().x509_public_bytes())?;
//! assert_eq!(&public, alice.public_key());
//! # Ok::<(), ecc_key::Error>(())
//! ```

extern crate alloc;

mod domain;
mod error;
mod key;
mod named;
mod point;
mod public_key;
mod secret_key;

pub mod ecdh;
pub mod ecdsa;
pub mod field;
pub mod registry;

pub use crate::{
    domain::{AlgorithmIdentifier, DomainParameters, EncodingMode},
    error::{Error, ErrorKind, Result},
    field::PrimeField,
    key::EcKey,
    named::NamedCurve,
    point::{Curve, EcPoint, PointFormat},
    public_key::EcPublicKey,
    secret_key::EcPrivateKey,
};
pub use der;
pub use num_bigint;
pub use rand_core;
