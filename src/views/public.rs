//! Citizen-facing pages that need no session: submit a demande, track it by
//! key, request a password reset.

use crate::forms::{self, FormError};
use crate::i18n::MessageKey;
use crate::net::ApiError;
use crate::net::types::{DemandeStatus, Municipalite, NewDemande};

use super::{Notice, ViewContext, ViewError, report};

// =============================================================================
// NOUVELLE DEMANDE
// =============================================================================

/// `/nouvelledemande`.
pub struct SubmissionView {
    ctx: ViewContext,
    municipalites: Vec<Municipalite>,
    tracking_key: Option<String>,
    notices: Vec<Notice>,
}

impl SubmissionView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx, municipalites: Vec::new(), tracking_key: None, notices: Vec::new() }
    }

    /// Fetch the municipality choices. Anonymous; failures leave the list empty.
    pub async fn load(&mut self) {
        match self.ctx.backend().list_municipalites(None).await {
            Ok(list) => self.municipalites = list,
            Err(e) => {
                tracing::warn!(error = %e, "fetching public municipalites failed");
                self.municipalites.clear();
            }
        }
    }

    #[must_use]
    pub fn municipalites(&self) -> &[Municipalite] {
        &self.municipalites
    }

    /// Key returned for the last successful submission.
    #[must_use]
    pub fn tracking_key(&self) -> Option<&str> {
        self.tracking_key.as_deref()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Submit `demande`, returning its tracking key on success.
    ///
    /// When the municipality list has been loaded, the chosen name must be
    /// one of its entries.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidForm`] when the form fails validation. Backend
    /// failures become notices and yield `Ok(None)`.
    pub async fn submit(&mut self, demande: &NewDemande) -> Result<Option<String>, ViewError> {
        forms::validate_new_demande(demande)?;
        if !self.municipalites.is_empty()
            && !self.municipalites.iter().any(|m| m.name_francais == demande.municipalite.trim())
        {
            return Err(FormError::Required("municipalite").into());
        }

        match self.ctx.backend().submit_demande(demande).await {
            Ok(created) => {
                tracing::info!(id = %created.id, "demande submitted");
                self.tracking_key.clone_from(&created.key);
                self.notices.push(self.ctx.success(MessageKey::DemandeSubmitted));
                Ok(created.key)
            }
            Err(e) => {
                report(&mut self.notices, self.ctx.error(MessageKey::ErrorSubmittingDemande), &e, "demande submission");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// SUIVI
// =============================================================================

/// `/suivdemande`.
pub struct TrackingView {
    ctx: ViewContext,
    result: Option<DemandeStatus>,
    notices: Vec<Notice>,
}

impl TrackingView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx, result: None, notices: Vec::new() }
    }

    #[must_use]
    pub fn result(&self) -> Option<&DemandeStatus> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Look up a demande by tracking key. A 404 yields a "not found" notice.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidForm`] for a blank key.
    pub async fn track(&mut self, key: &str) -> Result<Option<&DemandeStatus>, ViewError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(FormError::Required("key").into());
        }
        self.result = None;
        match self.ctx.backend().track_demande(key).await {
            Ok(status) => self.result = Some(status),
            Err(e) if e.status() == Some(404) => {
                tracing::debug!(key, "no demande for tracking key");
                self.notices.push(self.ctx.error(MessageKey::DemandeNotFound));
            }
            Err(e) => report(&mut self.notices, self.ctx.error(MessageKey::Error), &e, "demande tracking"),
        }
        Ok(self.result.as_ref())
    }
}

// =============================================================================
// MOT DE PASSE OUBLIE
// =============================================================================

/// `/mdpoublier`.
pub struct PasswordResetView {
    ctx: ViewContext,
    notices: Vec<Notice>,
}

impl PasswordResetView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx, notices: Vec::new() }
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Ask the backend to mail a reset link. Returns whether it accepted.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidForm`] for a missing or malformed address.
    pub async fn request(&mut self, email: &str) -> Result<bool, ViewError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(FormError::Required("email").into());
        }
        if !forms::is_valid_email(email) {
            return Err(FormError::InvalidEmail.into());
        }
        let outcome: Result<(), ApiError> = self.ctx.backend().request_password_reset(email).await;
        match outcome {
            Ok(()) => {
                self.notices.push(self.ctx.success(MessageKey::PasswordResetSent));
                Ok(true)
            }
            Err(e) => {
                report(&mut self.notices, self.ctx.error(MessageKey::ErrorPasswordReset), &e, "password reset request");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[path = "public_test.rs"]
mod tests;
