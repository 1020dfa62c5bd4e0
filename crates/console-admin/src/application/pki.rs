//! Aggregates the two-step PKI lookup into one list of CA descriptors.

use tracing::debug;

use crate::application::admin_api::{AdminApi, AdminError};
use crate::domain::CertificateAuthority;

/// Loads every configured certificate authority.
pub struct PkiService<'a, A: AdminApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: AdminApi + ?Sized> PkiService<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Lists CA ids, then fetches each descriptor in id order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing request and returns its error.
    pub async fn certificate_authorities(&self) -> Result<Vec<CertificateAuthority>, AdminError> {
        let ids = self.api.certificate_authorities().await?;
        debug!(count = ids.len(), "configured certificate authorities");

        let mut authorities = Vec::with_capacity(ids.len());
        for id in ids.keys() {
            authorities.push(self.api.certificate_authority(id).await?);
        }
        Ok(authorities)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
