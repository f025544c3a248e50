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
//! use tls_trust::{DefaultPolicy, GroupSelector, NamedGroup, kex};
//! use rand_core::OsRng;
//!
//! let group = GroupSelector::from(NamedGroup::Secp256r1);
//! let client = kex::generate_ephemeral_key(&group, &mut OsRng)?;
//! let server = kex::generate_ephemeral_key(&group, &mut OsRng)?;
//!
//! let k1 = kex::derive_shared_secret(&group, &client, &server.public_value(), &mut OsRng, &DefaultPolicy)?;
//! let k2 = kex::derive_shared_secret(&group, &server, &client.public_value(), &mut OsRng, &DefaultPolicy)?;
//! assert_eq!(k1.as_bytes(), k2.as_bytes());
//! # Ok::<(), tls_trust::Error>(())
//! ```

mod error;
mod group;

pub mod clock;
pub mod dh;
pub mod kex;
pub mod policy;
pub mod signature;
pub mod x509;

pub use crate::{
    clock::{FixedClock, SystemClock, TimeSource},
    dh::{DhGroup, DhPrivateKey, DhPublicKey},
    error::{Alert, Error, ErrorKind, Result},
    group::{GroupSelector, NamedGroup},
    kex::{EphemeralKey, SharedSecret},
    policy::{DefaultPolicy, PeerKey, Policy, PolicyConfig},
    signature::{DigestScheme, SignatureFormat},
    x509::{Usage, parse_ocsp_response, verify_cert_chain},
};
pub use ecc_key;
