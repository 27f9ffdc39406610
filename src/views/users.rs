//! `/users`: staff account management, superadmin only.
//!
//! Admins may open the page but see an empty list: the listing endpoint is
//! never called for them.

use crate::filter::filter_rows;
use crate::forms;
use crate::i18n::MessageKey;
use crate::net::ApiError;
use crate::net::types::{Role, User, UserForm};
use crate::routes::LOGIN_PATH;
use crate::session::Capability;

use super::{Confirmation, LoadOutcome, Notice, Phase, ViewContext, ViewError, report};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    Add(UserForm),
    Update { id: String, form: UserForm },
    Delete { id: String },
}

pub struct UsersView {
    ctx: ViewContext,
    can_list: bool,
    can_manage: bool,
    users: Vec<User>,
    search: String,
    editing: Option<String>,
    pending: Confirmation<UserAction>,
    notices: Vec<Notice>,
}

impl UsersView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        let can_list = ctx.session.has_capability(Capability::ListUsers);
        let can_manage = ctx.session.has_capability(Capability::ManageUsers);
        Self {
            ctx,
            can_list,
            can_manage,
            users: Vec::new(),
            search: String::new(),
            editing: None,
            pending: Confirmation::new(),
            notices: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        if !self.can_list {
            tracing::debug!("session cannot list users; showing none");
            self.users.clear();
            return LoadOutcome::Skipped;
        }
        let Some(token) = self.ctx.session.access_token() else {
            tracing::warn!("no access token; users not fetched");
            return LoadOutcome::Redirect(LOGIN_PATH.to_owned());
        };
        self.fetch(&token).await;
        LoadOutcome::Loaded
    }

    async fn fetch(&mut self, token: &str) {
        match self.ctx.backend().list_users(token).await {
            Ok(list) => self.users = list,
            Err(ApiError::UnexpectedShape(expected)) => {
                tracing::warn!(expected, "users response has no list; showing none");
                self.users.clear();
            }
            Err(e) => tracing::warn!(error = %e, "fetching users failed; keeping current list"),
        }
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn set_search(&mut self, term: &str) {
        term.clone_into(&mut self.search);
    }

    #[must_use]
    pub fn visible(&self) -> Vec<&User> {
        filter_rows(&self.users, &self.search)
    }

    /// Id of the account whose form is open for editing.
    #[must_use]
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.pending.phase()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&UserAction> {
        self.pending.pending()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Validate `form` and ask for confirmation to create the account.
    ///
    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::InvalidForm`] or
    /// [`ViewError::InvalidTransition`].
    pub fn add(&mut self, form: UserForm) -> Result<(), ViewError> {
        self.ensure_manage()?;
        forms::validate_user_form(&form)?;
        self.pending.request(UserAction::Add(form))?;
        Ok(())
    }

    /// Open `id` for editing; the returned form is pre-filled except for the
    /// password, which must be entered again. An account without a known role
    /// comes back with `role: None` so saving requires an explicit choice.
    ///
    /// # Errors
    ///
    /// [`ViewError::Forbidden`] or [`ViewError::NotFound`].
    pub fn begin_edit(&mut self, id: &str) -> Result<UserForm, ViewError> {
        self.ensure_manage()?;
        let user = self.find(id)?;
        let form = UserForm {
            nom: user.nom.clone(),
            prenom: user.prenom.clone(),
            email: user.email.clone(),
            password: String::new(),
            role: Role::parse(&user.role),
            numero_telephone: user.numero_telephone.clone(),
        };
        self.editing = Some(id.to_owned());
        Ok(form)
    }

    /// Validate the edited form and ask for confirmation to save it.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotEditing`] without a prior [`begin_edit`](Self::begin_edit),
    /// otherwise as [`add`](Self::add).
    pub fn save_edit(&mut self, form: UserForm) -> Result<(), ViewError> {
        self.ensure_manage()?;
        let id = self.editing.clone().ok_or(ViewError::NotEditing)?;
        forms::validate_user_form(&form)?;
        self.pending.request(UserAction::Update { id, form })?;
        Ok(())
    }

    /// Close the edit form, dropping an update still awaiting confirmation.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        if matches!(self.pending.pending(), Some(UserAction::Update { .. })) && self.pending.phase() == Phase::Confirming
        {
            if let Ok(action) = self.pending.cancel() {
                tracing::debug!(action = ?action, "pending user update dropped");
            }
            let _ = self.pending.reset();
        }
    }

    /// # Errors
    ///
    /// [`ViewError::Forbidden`], [`ViewError::NotFound`] or
    /// [`ViewError::InvalidTransition`].
    pub fn delete(&mut self, id: &str) -> Result<(), ViewError> {
        self.ensure_manage()?;
        self.find(id)?;
        self.pending.request(UserAction::Delete { id: id.to_owned() })?;
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
            UserAction::Add(form) => (
                backend.register_user(&token, form).await,
                MessageKey::UserAdded,
                MessageKey::ErrorAddingUser,
                "user registration",
            ),
            UserAction::Update { id, form } => (
                backend.modify_user(&token, id, form).await,
                MessageKey::UserUpdated,
                MessageKey::ErrorUpdatingUser,
                "user update",
            ),
            UserAction::Delete { id } => (
                backend.delete_user(&token, id).await,
                MessageKey::UserDeleted,
                MessageKey::ErrorDeletingUser,
                "user deletion",
            ),
        };

        match result {
            Ok(()) => {
                self.pending.finish()?;
                if matches!(action, UserAction::Update { .. }) {
                    self.editing = None;
                }
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

    fn find(&self, id: &str) -> Result<&User, ViewError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ViewError::NotFound { entity: "user", id: id.to_owned() })
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
