//! `/login`: the login form.

use crate::i18n::MessageKey;
use crate::routes::{DASHBOARD_PATH, LOGIN_PATH, return_url_of};
use crate::session::AuthError;

use super::{Notice, ViewContext};

pub struct LoginView {
    ctx: ViewContext,
    email: String,
    return_url: Option<String>,
    notices: Vec<Notice>,
}

impl LoginView {
    /// Form opened at `login_url`, which may carry a `returnUrl` query.
    #[must_use]
    pub fn new(ctx: ViewContext, login_url: &str) -> Self {
        Self { ctx, email: String::new(), return_url: return_url_of(login_url), notices: Vec::new() }
    }

    /// Email of the last attempt, kept so the form can be retried.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Attempt a login. On success returns where to navigate next: the
    /// return target when it is a local path, else `/dashboard`.
    pub async fn submit(&mut self, email: &str, password: &str) -> Option<String> {
        email.trim().clone_into(&mut self.email);

        match self.ctx.session.login(email, password).await {
            Ok(_) => Some(self.next_url()),
            Err(e) => {
                let key = match &e {
                    AuthError::InvalidForm(_) => MessageKey::InvalidForm,
                    AuthError::Api(_) => MessageKey::InvalidCredentials,
                    AuthError::MissingTokens => MessageKey::MissingTokens,
                    AuthError::Encode(_) => MessageKey::Error,
                };
                tracing::debug!(error = %e, "login form rejected");
                self.notices.push(self.ctx.error(key));
                None
            }
        }
    }

    fn next_url(&self) -> String {
        self.return_url
            .as_deref()
            .filter(|url| url.starts_with('/') && !url.starts_with("//") && !url.starts_with(LOGIN_PATH))
            .unwrap_or(DASHBOARD_PATH)
            .to_owned()
    }
}
