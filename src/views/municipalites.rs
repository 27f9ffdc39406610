//! `/municipalites`: municipality list, editable by superadmins.

use crate::forms::FormError;
use crate::i18n::MessageKey;
use crate::net::ApiError;
use crate::net::types::{Municipalite, NewMunicipalite};
use crate::routes::LOGIN_PATH;
use crate::session::Capability;

use super::{Confirmation, LoadOutcome, Notice, Phase, ViewContext, ViewError, report};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MunicipaliteAction {
    Add { name: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

pub struct MunicipalitesView {
    ctx: ViewContext,
    can_view: bool,
    can_manage: bool,
    municipalites: Vec<Municipalite>,
    search: String,
    pending: Confirmation<MunicipaliteAction>,
    notices: Vec<Notice>,
}

impl MunicipalitesView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        let can_view = ctx.session.has_capability(Capability::ViewMunicipalites);
        let can_manage = ctx.session.has_capability(Capability::ManageMunicipalites);
        Self {
            ctx,
            can_view,
            can_manage,
            municipalites: Vec::new(),
            search: String::new(),
            pending: Confirmation::new(),
            notices: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        let Some(token) = self.ctx.session.access_token() else {
            tracing::warn!("no access token; municipalites not fetched");
            return LoadOutcome::Redirect(LOGIN_PATH.to_owned());
        };
        if !self.can_view {
            tracing::debug!("session cannot view municipalites; showing none");
            self.municipalites.clear();
            return LoadOutcome::Skipped;
        }
        self.fetch(&token).await;
        LoadOutcome::Loaded
    }

    async fn fetch(&mut self, token: &str) {
        match self.ctx.backend().list_municipalites(Some(token)).await {
            Ok(list) => self.municipalites = list,
            Err(ApiError::UnexpectedShape(expected)) => {
                tracing::warn!(expected, "municipalites response is not a list; showing none");
                self.municipalites.clear();
            }
            Err(e) => {
                self.municipalites.clear();
                report(
                    &mut self.notices,
                    self.ctx.error(MessageKey::ErrorFetchingMunicipalities),
                    &e,
                    "fetching municipalites",
                );
            }
        }
    }

    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.can_manage
    }

    #[must_use]
    pub fn municipalites(&self) -> &[Municipalite] {
        &self.municipalites
    }

    pub fn set_search(&mut self, term: &str) {
        term.clone_into(&mut self.search);
    }

    /// Municipalities whose name contains the search term, ignoring case.
    #[must_use]
    pub fn visible(&self) -> Vec<&Municipalite> {
        let needle = self.search.to_lowercase();
        self.municipalites
            .iter()
            .filter(|m| m.name_francais.to_lowercase().contains(&needle))
            .collect()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.pending.phase()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&MunicipaliteAction> {
        self.pending.pending()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Request confirmation to create `name`.
    ///
    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::InvalidForm`] for a blank name,
    /// or [`ViewError::InvalidTransition`].
    pub fn add(&mut self, name: &str) -> Result<(), ViewError> {
        self.ensure_manage()?;
        let name = required_name(name)?;
        self.pending.request(MunicipaliteAction::Add { name })?;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`add`](Self::add), plus [`ViewError::NotFound`].
    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), ViewError> {
        self.ensure_manage()?;
        self.find(id)?;
        let name = required_name(name)?;
        self.pending.request(MunicipaliteAction::Rename { id: id.to_owned(), name })?;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::NotFound`] or
    /// [`ViewError::InvalidTransition`].
    pub fn delete(&mut self, id: &str) -> Result<(), ViewError> {
        self.ensure_manage()?;
        self.find(id)?;
        self.pending.request(MunicipaliteAction::Delete { id: id.to_owned() })?;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ViewError::InvalidTransition`] when nothing awaits confirmation.
    pub fn cancel(&mut self) -> Result<(), ViewError> {
        self.pending.cancel()?;
        self.pending.reset()?;
        Ok(())
    }

    /// Execute the pending action and reload the list after success.
    ///
    /// # Errors
    ///
    /// [`ViewError::NoSession`] or [`ViewError::InvalidTransition`].
    pub async fn confirm(&mut self) -> Result<(), ViewError> {
        let token = self.ctx.session.access_token().ok_or(ViewError::NoSession)?;
        self.pending.confirm()?;
        let action = self.pending.start()?.clone();
        let backend = self.ctx.backend().clone();

        let (result, ok, failed, what) = match &action {
            MunicipaliteAction::Add { name } => (
                backend
                    .create_municipalite(&token, &NewMunicipalite { name_francais: name.clone() })
                    .await
                    .map(drop),
                MessageKey::MunicipalityAdded,
                MessageKey::ErrorAddingMunicipality,
                "municipalite creation",
            ),
            MunicipaliteAction::Rename { id, name } => (
                backend
                    .update_municipalite(&token, &Municipalite { id: id.clone(), name_francais: name.clone() })
                    .await
                    .map(drop),
                MessageKey::MunicipalityUpdated,
                MessageKey::ErrorUpdatingMunicipality,
                "municipalite update",
            ),
            MunicipaliteAction::Delete { id } => (
                backend.delete_municipalite(&token, id).await,
                MessageKey::MunicipalityDeleted,
                MessageKey::ErrorDeletingMunicipality,
                "municipalite deletion",
            ),
        };

        match result {
            Ok(()) => {
                self.pending.finish()?;
                tracing::info!(action = ?action, "municipalite mutation applied");
                self.notices.push(self.ctx.success(ok));
                self.fetch(&token).await;
            }
            Err(e) => {
                self.pending.fail()?;
                report(&mut self.notices, self.ctx.error(failed), &e, what);
            }
        }
        Ok(())
    }

    fn ensure_manage(&self) -> Result<(), ViewError> {
        if self.can_manage { Ok(()) } else { Err(ViewError::Forbidden) }
    }

    fn find(&self, id: &str) -> Result<&Municipalite, ViewError> {
        self.municipalites
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ViewError::NotFound { entity: "municipalite", id: id.to_owned() })
    }
}

fn required_name(raw: &str) -> Result<String, FormError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(FormError::Required("name_francais"));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[path = "municipalites_test.rs"]
mod tests;
