//! Navigation table and route guard.
//!
//! DESIGN
//! ======
//! The guard is coarse: it only checks "authenticated and holds a recognized
//! staff role". Per-page restrictions (users listing for superadmins only,
//! municipality edits) are enforced by each view through
//! [`Capability`](crate::session::Capability).
//!
//! Decisions are synchronous and have exactly two outcomes; there is no
//! pending state while a session loads because hydration is a local read.

use std::fmt;

use crate::session::{AuthSession, Session};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/home";
pub const DASHBOARD_PATH: &str = "/dashboard";
const RETURN_URL_PARAM: &str = "returnUrl";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    NouvelleDemande,
    SuivDemande,
    MdpOublier,
    Dashboard,
    Demandes,
    Users,
    Municipalites,
}

impl Route {
    pub const ALL: [Self; 9] = [
        Self::Home,
        Self::Login,
        Self::NouvelleDemande,
        Self::SuivDemande,
        Self::MdpOublier,
        Self::Dashboard,
        Self::Demandes,
        Self::Users,
        Self::Municipalites,
    ];

    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Login => "login",
            Self::NouvelleDemande => "nouvelledemande",
            Self::SuivDemande => "suivdemande",
            Self::MdpOublier => "mdpoublier",
            Self::Dashboard => "dashboard",
            Self::Demandes => "demandes",
            Self::Users => "users",
            Self::Municipalites => "municipalites",
        }
    }

    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.segment() == segment)
    }

    /// Staff-only pages sit behind the guard.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Demandes | Self::Users | Self::Municipalites)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segment())
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny { redirect: String },
}

/// Decide whether `requested_url` may be entered with `session`.
///
/// Only a missing session or token keeps the requested URL as the login
/// return target; role failures send the user to a bare `/login`.
#[must_use]
pub fn check(session: Option<&Session>, requested_url: &str) -> GuardDecision {
    let Some(session) = session.filter(|s| s.is_authenticated()) else {
        tracing::debug!(url = requested_url, "no session or access token; redirecting to login");
        return GuardDecision::Deny { redirect: login_redirect(Some(requested_url)) };
    };

    if session.groups.is_none() {
        tracing::warn!(url = requested_url, "session carries no groups; redirecting to login");
        return GuardDecision::Deny { redirect: login_redirect(None) };
    }

    if session.is_staff() {
        tracing::debug!(
            url = requested_url,
            super_admin = session.is_super_admin(),
            admin = session.is_admin(),
            "navigation allowed"
        );
        return GuardDecision::Allow;
    }

    tracing::debug!(url = requested_url, "no staff role; redirecting to login");
    GuardDecision::Deny { redirect: login_redirect(None) }
}

/// Guard bound to the process-wide session manager.
pub struct RouteGuard<'a> {
    auth: &'a AuthSession,
}

impl<'a> RouteGuard<'a> {
    #[must_use]
    pub fn new(auth: &'a AuthSession) -> Self {
        Self { auth }
    }

    #[must_use]
    pub fn can_activate(&self, requested_url: &str) -> GuardDecision {
        check(self.auth.session().as_ref(), requested_url)
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(String),
}

/// Resolve a URL against the route table, consulting the guard for
/// protected pages. The empty path and unknown paths go to `/home`.
#[must_use]
pub fn navigate(auth: &AuthSession, url: &str) -> Navigation {
    let target = normalize_url(url);
    let segment = path_of(&target).trim_matches('/');

    if segment.is_empty() {
        return Navigation::Redirect(HOME_PATH.to_owned());
    }
    let Some(route) = Route::from_segment(segment) else {
        tracing::debug!(url, "unknown route; redirecting home");
        return Navigation::Redirect(HOME_PATH.to_owned());
    };
    if !route.is_protected() {
        return Navigation::Render(route);
    }
    match RouteGuard::new(auth).can_activate(&target) {
        GuardDecision::Allow => Navigation::Render(route),
        GuardDecision::Deny { redirect } => Navigation::Redirect(redirect),
    }
}

/// `/login`, optionally carrying `returnUrl`.
#[must_use]
pub fn login_redirect(return_url: Option<&str>) -> String {
    match return_url {
        Some(url) => format!("{LOGIN_PATH}?{RETURN_URL_PARAM}={}", encode_query_value(url)),
        None => LOGIN_PATH.to_owned(),
    }
}

/// Extract and decode `returnUrl` from a login URL.
#[must_use]
pub fn return_url_of(login_url: &str) -> Option<String> {
    let (_, query) = login_url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == RETURN_URL_PARAM)
        .map(|(_, v)| decode_query_value(v))
        .filter(|v| !v.is_empty())
}

/// Canonical form: leading slash, no trailing slash on the path, fragment
/// dropped, query kept.
fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (url, None),
    };
    let path = path.trim_matches('/');
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("/{path}?{q}"),
        None => format!("/{path}"),
    }
}

fn path_of(url: &str) -> &str {
    url.split_once('?').map_or(url, |(p, _)| p)
}

/// Percent-encode a query value, then put slashes back so return targets
/// read as paths (`/login?returnUrl=/users`).
fn encode_query_value(raw: &str) -> String {
    urlencoding::encode(raw).replace("%2F", "/")
}

/// Malformed escapes pass through literally; invalid UTF-8 is replaced.
fn decode_query_value(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
