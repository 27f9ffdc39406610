//! Page controllers.
//!
//! SYSTEM CONTEXT
//! ==============
//! One controller per page. Each holds the page's fetched collections, its
//! search term, a [`Confirmation`](confirm::Confirmation) for pending
//! mutations and the notices raised so far. Front ends (the CLI today) call
//! the controller, await it, then render its state.
//!
//! ERROR HANDLING
//! ==============
//! Backend failures never escape a controller as errors: they are logged and
//! turned into a [`Notice`]. [`ViewError`] is reserved for calls the
//! controller refuses locally (missing capability, unknown id, a confirmation
//! step out of order, an invalid form, no session).

pub mod confirm;
pub mod dashboard;
pub mod demandes;
pub mod login;
pub mod municipalites;
pub mod public;
pub mod users;

use std::sync::Arc;

use crate::forms::FormError;
use crate::i18n::{Lang, MessageKey};
use crate::net::{ApiError, Backend};
use crate::session::AuthSession;

pub use confirm::{Confirmation, Phase, TransitionError};

/// Shared handles every controller is built from.
#[derive(Clone)]
pub struct ViewContext {
    pub session: Arc<AuthSession>,
    pub lang: Lang,
}

impl ViewContext {
    #[must_use]
    pub fn new(session: Arc<AuthSession>, lang: Lang) -> Self {
        Self { session, lang }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.session.backend()
    }

    #[must_use]
    pub fn success(&self, key: MessageKey) -> Notice {
        Notice::Success(key.text(self.lang).to_owned())
    }

    #[must_use]
    pub fn error(&self, key: MessageKey) -> Notice {
        Notice::Error { title: MessageKey::Oops.text(self.lang).to_owned(), text: key.text(self.lang).to_owned() }
    }
}

/// User-facing feedback raised by a controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error { title: String, text: String },
}

impl Notice {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Error { text, .. } => text,
        }
    }
}

/// Result of a page load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// No session: the caller should navigate to this URL.
    Redirect(String),
    /// The session lacks the capability; nothing was requested.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("action not permitted for the current session")]
    Forbidden,

    #[error("no {entity} with id '{id}'")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("invalid form: {0}")]
    InvalidForm(#[from] FormError),

    /// `save_edit` without a preceding `begin_edit`.
    #[error("no user is being edited")]
    NotEditing,

    #[error("no active session")]
    NoSession,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Push `notice` after logging the failure that caused it.
fn report(notices: &mut Vec<Notice>, notice: Notice, error: &ApiError, what: &'static str) {
    tracing::warn!(error = %error, status = ?error.status(), "{what} failed");
    notices.push(notice);
}
