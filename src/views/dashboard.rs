//! `/dashboard`: processing statistics for staff.

use crate::i18n::MessageKey;
use crate::net::types::DemandeStats;
use crate::routes::LOGIN_PATH;
use crate::session::Capability;

use super::{LoadOutcome, Notice, ViewContext, report};

pub struct DashboardView {
    ctx: ViewContext,
    stats: Option<DemandeStats>,
    notices: Vec<Notice>,
}

impl DashboardView {
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx, stats: None, notices: Vec::new() }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        let Some(token) = self.ctx.session.access_token() else {
            tracing::warn!("no access token; statistics not fetched");
            return LoadOutcome::Redirect(LOGIN_PATH.to_owned());
        };
        if !self.ctx.session.has_capability(Capability::ViewStatistics) {
            return LoadOutcome::Skipped;
        }
        match self.ctx.backend().demande_stats(&token).await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => report(
                &mut self.notices,
                self.ctx.error(MessageKey::ErrorFetchingStatistics),
                &e,
                "fetching statistics",
            ),
        }
        LoadOutcome::Loaded
    }

    #[must_use]
    pub fn stats(&self) -> Option<&DemandeStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
