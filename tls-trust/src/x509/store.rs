//! Trusted certificate stores.

use super::Certificate;
use std::sync::{Arc, PoisonError, RwLock};

/// A source of trust anchors.
pub trait CertificateStore: Send + Sync {
    /// Certificates whose subject is `subject`.
    fn find_by_subject(&self, subject: &str) -> Vec<Arc<Certificate>>;

    /// Every certificate in the store.
    fn all(&self) -> Vec<Arc<Certificate>>;

    /// Does the store hold exactly this certificate?
    fn contains(&self, cert: &Certificate) -> bool {
        self.find_by_subject(cert.subject())
            .iter()
            .any(|candidate| candidate.as_ref() == cert)
    }
}

/// Certificate store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    certs: RwLock<Vec<Arc<Certificate>>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `certs`.
    pub fn with_certificates(certs: impl IntoIterator<Item = Certificate>) -> Self {
        Self {
            certs: RwLock::new(certs.into_iter().map(Arc::new).collect()),
        }
    }

    /// Add a certificate. Adding one already present is a no-op.
    pub fn add(&self, cert: Certificate) {
        let mut certs = self.certs.write().unwrap_or_else(PoisonError::into_inner);

        if certs.iter().any(|existing| existing.as_ref() == &cert) {
            return;
        }

        tracing::debug!(subject = cert.subject(), "adding trusted certificate");
        certs.push(Arc::new(cert));
    }

    /// Number of certificates held.
    pub fn len(&self) -> usize {
        self.certs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CertificateStore for InMemoryStore {
    fn find_by_subject(&self, subject: &str) -> Vec<Arc<Certificate>> {
        self.certs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|cert| cert.subject() == subject)
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<Arc<Certificate>> {
        self.certs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
