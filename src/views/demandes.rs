//! `/demandes`: staff list of citizen demandes with status changes and
//! deletion.
//!
//! DESIGN
//! ======
//! A status change is applied to the local row as soon as it is requested so
//! the list shows the chosen value while the user confirms. Cancelling puts
//! the previous value back. What happens to the local value when the `PUT`
//! fails is a [`StatusRevertPolicy`].
//!
//! Deletion refetches the list only after the `DELETE` succeeded.

use crate::filter::filter_rows;
use crate::i18n::MessageKey;
use crate::net::ApiError;
use crate::net::types::{Demande, Municipalite, Statut};
use crate::routes::LOGIN_PATH;
use crate::session::Capability;

use super::{Confirmation, LoadOutcome, Notice, Phase, ViewContext, ViewError, report};

/// Local status after a rejected status update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusRevertPolicy {
    /// Leave the optimistic value in place until the next reload.
    #[default]
    KeepLocal,
    /// Put the previous value back.
    RevertOnFailure,
}

impl StatusRevertPolicy {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep-local" => Some(Self::KeepLocal),
            "revert" | "revert-on-failure" => Some(Self::RevertOnFailure),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DemandeAction {
    ChangeStatus { id: String, previous: Statut, next: Statut },
    Delete { id: String },
}

pub struct DemandesView {
    ctx: ViewContext,
    policy: StatusRevertPolicy,
    can_view: bool,
    can_update: bool,
    can_delete: bool,
    demandes: Vec<Demande>,
    municipalites: Vec<Municipalite>,
    search: String,
    pending: Confirmation<DemandeAction>,
    notices: Vec<Notice>,
}

impl DemandesView {
    #[must_use]
    pub fn new(ctx: ViewContext, policy: StatusRevertPolicy) -> Self {
        let can_view = ctx.session.has_capability(Capability::ViewDemandes);
        let can_update = ctx.session.has_capability(Capability::UpdateDemandeStatus);
        let can_delete = ctx.session.has_capability(Capability::DeleteDemande);
        Self {
            ctx,
            policy,
            can_view,
            can_update,
            can_delete,
            demandes: Vec::new(),
            municipalites: Vec::new(),
            search: String::new(),
            pending: Confirmation::new(),
            notices: Vec::new(),
        }
    }

    /// Fetch demandes, then the municipality list used by the page filters.
    /// A session without a staff role fetches nothing.
    pub async fn load(&mut self) -> LoadOutcome {
        let Some(token) = self.ctx.session.access_token() else {
            tracing::warn!("no access token; demandes not fetched");
            return LoadOutcome::Redirect(LOGIN_PATH.to_owned());
        };
        if !self.can_view {
            tracing::debug!("session cannot view demandes; showing none");
            self.demandes.clear();
            self.municipalites.clear();
            return LoadOutcome::Skipped;
        }
        self.fetch_demandes(&token).await;

        match self.ctx.backend().list_municipalites(Some(&token)).await {
            Ok(list) => self.municipalites = list,
            Err(e) => tracing::warn!(error = %e, "fetching municipalites failed"),
        }
        LoadOutcome::Loaded
    }

    async fn fetch_demandes(&mut self, token: &str) {
        match self.ctx.backend().list_demandes(token).await {
            Ok(list) => self.demandes = list,
            Err(ApiError::UnexpectedShape(expected)) => {
                tracing::warn!(expected, "demandes response is not a list; showing none");
                self.demandes.clear();
            }
            Err(e) => tracing::warn!(error = %e, "fetching demandes failed; keeping current list"),
        }
    }

    #[must_use]
    pub fn demandes(&self) -> &[Demande] {
        &self.demandes
    }

    #[must_use]
    pub fn municipalites(&self) -> &[Municipalite] {
        &self.municipalites
    }

    pub fn set_search(&mut self, term: &str) {
        term.clone_into(&mut self.search);
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Rows matching the current search term on any column.
    #[must_use]
    pub fn visible(&self) -> Vec<&Demande> {
        filter_rows(&self.demandes, &self.search)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.pending.phase()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&DemandeAction> {
        self.pending.pending()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Show `next` on the row and ask for confirmation.
    ///
    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::NotFound`], or
    /// [`ViewError::InvalidTransition`] if another action is pending.
    pub fn begin_status_change(&mut self, id: &str, next: Statut) -> Result<(), ViewError> {
        if !self.can_update {
            return Err(ViewError::Forbidden);
        }
        let previous = self.find(id)?.statut;
        self.pending.request(DemandeAction::ChangeStatus { id: id.to_owned(), previous, next })?;
        self.set_local_status(id, next);
        Ok(())
    }

    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::NotFound`], or
    /// [`ViewError::InvalidTransition`] if another action is pending.
    pub fn begin_delete(&mut self, id: &str) -> Result<(), ViewError> {
        if !self.can_delete {
            return Err(ViewError::Forbidden);
        }
        self.find(id)?;
        self.pending.request(DemandeAction::Delete { id: id.to_owned() })?;
        Ok(())
    }

    /// Decline the pending action; a status change is undone locally.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidTransition`] when nothing awaits confirmation.
    pub fn cancel(&mut self) -> Result<(), ViewError> {
        if let DemandeAction::ChangeStatus { id, previous, .. } = self.pending.cancel()? {
            self.set_local_status(&id, previous);
        }
        self.pending.reset()?;
        Ok(())
    }

    /// Execute the pending action. Backend failures become notices.
    ///
    /// # Errors
    ///
    /// [`ViewError::NoSession`] or [`ViewError::InvalidTransition`].
    pub async fn confirm(&mut self) -> Result<(), ViewError> {
        let token = self.ctx.session.access_token().ok_or(ViewError::NoSession)?;
        self.pending.confirm()?;
        let action = self.pending.start()?.clone();

        match action {
            DemandeAction::ChangeStatus { id, previous, next } => {
                match self.ctx.backend().update_statut(&token, &id, next).await {
                    Ok(()) => {
                        self.pending.finish()?;
                        tracing::info!(id = %id, statut = %next, "status updated");
                        self.notices.push(self.ctx.success(MessageKey::StatusUpdated));
                    }
                    Err(e) => {
                        self.pending.fail()?;
                        report(&mut self.notices, self.ctx.error(MessageKey::ErrorUpdatingStatus), &e, "status update");
                        if self.policy == StatusRevertPolicy::RevertOnFailure {
                            self.set_local_status(&id, previous);
                        }
                    }
                }
            }
            DemandeAction::Delete { id } => match self.ctx.backend().delete_demande(&token, &id).await {
                Ok(()) => {
                    self.pending.finish()?;
                    tracing::info!(id = %id, "demande deleted");
                    self.notices.push(self.ctx.success(MessageKey::DemandeDeleted));
                    self.fetch_demandes(&token).await;
                }
                Err(e) => {
                    self.pending.fail()?;
                    report(&mut self.notices, self.ctx.error(MessageKey::ErrorDeletingDemande), &e, "demande deletion");
                }
            },
        }
        Ok(())
    }

    fn find(&self, id: &str) -> Result<&Demande, ViewError> {
        self.demandes
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ViewError::NotFound { entity: "demande", id: id.to_owned() })
    }

    fn set_local_status(&mut self, id: &str, statut: Statut) {
        if let Some(d) = self.demandes.iter_mut().find(|d| d.id == id) {
            d.statut = statut;
        }
    }
}

#[cfg(test)]
#[path = "demandes_test.rs"]
mod tests;
