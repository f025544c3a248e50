//! Process-wide registry mapping object identifiers to algorithm and curve
//! names, and back.
//!
//! The table is built on first use and guarded by a reader/writer lock, so
//! lookups from concurrent handshakes only contend with (rare) registrations.

use crate::{Error, Result, named::NamedCurve};
use der::asn1::ObjectIdentifier;
use std::{
    collections::HashMap,
    sync::{OnceLock, PoisonError, RwLock},
};

/// `id-ecPublicKey`
pub const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// `prime-field` field type of explicit curve parameters.
pub const PRIME_FIELD: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.1.1");

/// `ecdsa-with-SHA224`
pub const ECDSA_WITH_SHA224: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.1");

/// `ecdsa-with-SHA256`
pub const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// `ecdsa-with-SHA384`
pub const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

/// `ecdsa-with-SHA512`
pub const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");

const BUILTIN: &[(&str, &str)] = &[
    ("1.2.840.10045.2.1", "ECDSA"),
    ("1.2.840.10045.1.1", "prime-field"),
    ("1.2.840.10045.4.3.1", "ECDSA/SHA-224"),
    ("1.2.840.10045.4.3.2", "ECDSA/SHA-256"),
    ("1.2.840.10045.4.3.3", "ECDSA/SHA-384"),
    ("1.2.840.10045.4.3.4", "ECDSA/SHA-512"),
    ("2.16.840.1.101.3.4.2.4", "SHA-224"),
    ("2.16.840.1.101.3.4.2.1", "SHA-256"),
    ("2.16.840.1.101.3.4.2.2", "SHA-384"),
    ("2.16.840.1.101.3.4.2.3", "SHA-512"),
];

#[derive(Default)]
struct OidMap {
    by_name: HashMap<String, ObjectIdentifier>,
    by_oid: HashMap<ObjectIdentifier, String>,
}

impl OidMap {
    fn with_builtins() -> Self {
        let mut map = Self::default();

        for curve in NamedCurve::ALL {
            map.insert(curve.oid(), curve.name());
        }

        for (oid, name) in BUILTIN {
            if let Ok(oid) = ObjectIdentifier::new(oid) {
                map.insert(oid, name);
            }
        }

        map
    }

    fn insert(&mut self, oid: ObjectIdentifier, name: &str) {
        self.by_name.entry(name.to_owned()).or_insert(oid);
        self.by_oid.entry(oid).or_insert_with(|| name.to_owned());
    }
}

static REGISTRY: OnceLock<RwLock<OidMap>> = OnceLock::new();

fn registry() -> &'static RwLock<OidMap> {
    REGISTRY.get_or_init(|| RwLock::new(OidMap::with_builtins()))
}

/// Register `oid` under `name`.
///
/// Re-registering an identical pair is a no-op; binding a name or an OID
/// that is already bound to something else is an
/// [`Error::InvalidArgument`].
pub fn add_oid(oid: ObjectIdentifier, name: &str) -> Result<()> {
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = map.by_name.get(name) {
        if *existing != oid {
            return Err(Error::invalid_argument(format!(
                "cannot register two different OIDs to the name {name}"
            )));
        }
    }

    if let Some(existing) = map.by_oid.get(&oid) {
        if existing != name {
            return Err(Error::invalid_argument(format!(
                "cannot register two different names to the OID {oid}"
            )));
        }
    }

    map.insert(oid, name);
    Ok(())
}

/// Look up the OID registered under `name`. A dotted-decimal string is
/// accepted as well.
pub fn str2oid(name: &str) -> Result<ObjectIdentifier> {
    let map = registry().read().unwrap_or_else(PoisonError::into_inner);

    if let Some(oid) = map.by_name.get(name) {
        return Ok(*oid);
    }

    ObjectIdentifier::new(name).map_err(|_| Error::UnknownIdentifier(name.to_owned()))
}

/// Look up the name registered for `oid`.
pub fn oid2str(oid: &ObjectIdentifier) -> Result<String> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .by_oid
        .get(oid)
        .cloned()
        .ok_or_else(|| Error::UnknownIdentifier(oid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{ID_EC_PUBLIC_KEY, add_oid, oid2str, str2oid};
    use crate::Error;
    use der::asn1::ObjectIdentifier;

    #[test]
    fn builtin_curves_resolve_both_ways() {
        let oid = str2oid("secp256r1").unwrap();
        assert_eq!(oid.to_string(), "1.2.840.10045.3.1.7");
        assert_eq!(oid2str(&oid).unwrap(), "secp256r1");
        assert_eq!(oid2str(&ID_EC_PUBLIC_KEY).unwrap(), "ECDSA");
    }

    #[test]
    fn unknown_lookups_are_errors() {
        assert!(matches!(
            str2oid("not-a-curve"),
            Err(Error::UnknownIdentifier(_))
        ));

        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.55555.99");
        assert!(matches!(oid2str(&oid), Err(Error::UnknownIdentifier(_))));
    }

    #[test]
    fn registration_conflicts_are_rejected() {
        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.55555.1");
        add_oid(oid, "test-registry-entry").unwrap();
        add_oid(oid, "test-registry-entry").unwrap();
        assert_eq!(str2oid("test-registry-entry").unwrap(), oid);

        let other = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.55555.2");
        assert!(add_oid(other, "test-registry-entry").is_err());
        assert!(add_oid(oid, "another-name").is_err());
    }
}
