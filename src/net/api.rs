//! REST client for the demandes backend.
//!
//! ARCHITECTURE
//! ============
//! [`Backend`] is the seam between page controllers and the network: views
//! and the session manager hold an `Arc<dyn Backend>`, production code plugs
//! in [`RestBackend`] (reqwest), tests plug in a recording mock.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx statuses surface as [`ApiError::Status`] with the response body so
//! callers can log the backend's `{"error": ...}` message. A list endpoint that
//! answers with something other than an array yields
//! [`ApiError::UnexpectedShape`]; views treat that as an empty collection.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{
    Credentials, Demande, DemandeStats, DemandeStatus, LoginResponse, Municipalite, NewDemande, NewMunicipalite,
    Statut, StatutUpdate, TauxResponse, TotalResponse, TraiteResponse, User, UserForm,
};

pub const LOGIN_PATH: &str = "/authentification/users/login/";
pub const LOGOUT_PATH: &str = "/authentification/users/logout/";
pub const USERS_PATH: &str = "/authentification/users/affiche/";
pub const REGISTER_PATH: &str = "/authentification/users/register/";
pub const PASSWORD_RESET_PATH: &str = "/authentification/reset-password/request/";
pub const DEMANDES_PATH: &str = "/demandes/";
pub const DEMANDES_TOTAL_PATH: &str = "/demandes/total/";
pub const DEMANDES_TRAITE_PATH: &str = "/demandes/traite/";
pub const DEMANDES_TAUX_PATH: &str = "/demandes/taux-traitement/";
pub const MUNICIPALITES_PATH: &str = "/municipalites/";

/// Ids and tracking keys fill exactly one path segment. Reserved characters
/// are percent-encoded; empty and dot segments are refused since URL
/// resolution would collapse them into another endpoint.
fn segment(raw: &str) -> Result<std::borrow::Cow<'_, str>, ApiError> {
    if matches!(raw, "" | "." | "..") {
        return Err(ApiError::InvalidSegment(raw.to_owned()));
    }
    Ok(urlencoding::encode(raw))
}

pub(crate) fn demande_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/demandes/{}/", segment(id)?))
}

pub(crate) fn municipalite_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/municipalites/{}/", segment(id)?))
}

pub(crate) fn modify_user_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/authentification/users/modifier/{}/", segment(id)?))
}

pub(crate) fn delete_user_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/authentification/users/delete/{}/", segment(id)?))
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure: connection refused, DNS, TLS, broken body stream.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON for the expected type.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The response was JSON but not the expected collection shape.
    #[error("unexpected response shape: expected {0}")]
    UnexpectedShape(&'static str),

    /// An id or tracking key that cannot stand as a single path segment.
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status of a rejected request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Every backend operation the portal issues. Methods taking `token` send it
/// as `Authorization: Bearer <token>`.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Blacklist a refresh token server-side.
    async fn logout(&self, token: &str, refresh: &str) -> Result<(), ApiError>;

    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError>;

    async fn list_demandes(&self, token: &str) -> Result<Vec<Demande>, ApiError>;

    /// Public submission; the created record carries the tracking key.
    async fn submit_demande(&self, demande: &NewDemande) -> Result<Demande, ApiError>;

    /// Public lookup by tracking key.
    async fn track_demande(&self, key: &str) -> Result<DemandeStatus, ApiError>;

    async fn update_statut(&self, token: &str, id: &str, statut: Statut) -> Result<(), ApiError>;

    async fn delete_demande(&self, token: &str, id: &str) -> Result<(), ApiError>;

    async fn demande_stats(&self, token: &str) -> Result<DemandeStats, ApiError>;

    /// Listing is public on the backend; the token is attached when present.
    async fn list_municipalites(&self, token: Option<&str>) -> Result<Vec<Municipalite>, ApiError>;

    async fn create_municipalite(&self, token: &str, municipalite: &NewMunicipalite) -> Result<Municipalite, ApiError>;

    async fn update_municipalite(&self, token: &str, municipalite: &Municipalite) -> Result<Municipalite, ApiError>;

    async fn delete_municipalite(&self, token: &str, id: &str) -> Result<(), ApiError>;

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError>;

    async fn register_user(&self, token: &str, form: &UserForm) -> Result<(), ApiError>;

    async fn modify_user(&self, token: &str, id: &str, form: &UserForm) -> Result<(), ApiError>;

    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ApiError>;
}

// =============================================================================
// REQWEST IMPLEMENTATION
// =============================================================================

/// Optional client-side limits. `None` keeps reqwest's default of waiting
/// indefinitely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Option<Duration>,
    pub connect: Option<Duration>,
}

pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
}

impl RestBackend {
    /// Build a client rooted at `base_url` (trailing slash ignored).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot initialize.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(request) = timeouts.request {
            builder = builder.timeout(request);
        }
        if let Some(connect) = timeouts.connect {
            builder = builder.connect_timeout(connect);
        }
        let http = builder.build().map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status: status.as_u16(), body })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Decode `value` as a list, distinguishing "not an array" from "array of the
/// wrong records".
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value, expected: &'static str) -> Result<Vec<T>, ApiError> {
    if !value.is_array() {
        return Err(ApiError::UnexpectedShape(expected));
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Unwrap the `{"users": [...]}` envelope of the user listing.
pub(crate) fn decode_users(value: Value) -> Result<Vec<User>, ApiError> {
    match value {
        Value::Object(mut map) => {
            let users = map.remove("users").unwrap_or(Value::Null);
            decode_list(users, "`users` array")
        }
        _ => Err(ApiError::UnexpectedShape("`users` array")),
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let builder = self.request(reqwest::Method::POST, LOGIN_PATH, None).json(credentials);
        self.send_json(builder).await
    }

    async fn logout(&self, token: &str, refresh: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "refresh": refresh });
        let builder = self.request(reqwest::Method::POST, LOGOUT_PATH, Some(token)).json(&body);
        self.send(builder).await?;
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "email": email });
        let builder = self.request(reqwest::Method::POST, PASSWORD_RESET_PATH, None).json(&body);
        self.send(builder).await?;
        Ok(())
    }

    async fn list_demandes(&self, token: &str) -> Result<Vec<Demande>, ApiError> {
        let value: Value = self.send_json(self.request(reqwest::Method::GET, DEMANDES_PATH, Some(token))).await?;
        decode_list(value, "array of demandes")
    }

    async fn submit_demande(&self, demande: &NewDemande) -> Result<Demande, ApiError> {
        let builder = self.request(reqwest::Method::POST, DEMANDES_PATH, None).json(demande);
        self.send_json(builder).await
    }

    async fn track_demande(&self, key: &str) -> Result<DemandeStatus, ApiError> {
        let builder = self.request(reqwest::Method::GET, &demande_path(key)?, None);
        self.send_json(builder).await
    }

    async fn update_statut(&self, token: &str, id: &str, statut: Statut) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &demande_path(id)?, Some(token))
            .json(&StatutUpdate { statut });
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_demande(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, &demande_path(id)?, Some(token))).await?;
        Ok(())
    }

    async fn demande_stats(&self, token: &str) -> Result<DemandeStats, ApiError> {
        let total: TotalResponse = self
            .send_json(self.request(reqwest::Method::GET, DEMANDES_TOTAL_PATH, Some(token)))
            .await?;
        let traite: TraiteResponse = self
            .send_json(self.request(reqwest::Method::GET, DEMANDES_TRAITE_PATH, Some(token)))
            .await?;
        let taux: TauxResponse = self
            .send_json(self.request(reqwest::Method::GET, DEMANDES_TAUX_PATH, Some(token)))
            .await?;
        Ok(DemandeStats {
            total: total.total_demandes,
            traitees: traite.total_demandes_traitees,
            taux_traitement: taux.taux_traitement,
        })
    }

    async fn list_municipalites(&self, token: Option<&str>) -> Result<Vec<Municipalite>, ApiError> {
        let value: Value = self.send_json(self.request(reqwest::Method::GET, MUNICIPALITES_PATH, token)).await?;
        decode_list(value, "array of municipalites")
    }

    async fn create_municipalite(&self, token: &str, municipalite: &NewMunicipalite) -> Result<Municipalite, ApiError> {
        let builder = self
            .request(reqwest::Method::POST, MUNICIPALITES_PATH, Some(token))
            .json(municipalite);
        self.send_json(builder).await
    }

    async fn update_municipalite(&self, token: &str, municipalite: &Municipalite) -> Result<Municipalite, ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &municipalite_path(&municipalite.id)?, Some(token))
            .json(municipalite);
        self.send_json(builder).await
    }

    async fn delete_municipalite(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, &municipalite_path(id)?, Some(token)))
            .await?;
        Ok(())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        let value: Value = self.send_json(self.request(reqwest::Method::GET, USERS_PATH, Some(token))).await?;
        decode_users(value)
    }

    async fn register_user(&self, token: &str, form: &UserForm) -> Result<(), ApiError> {
        let builder = self.request(reqwest::Method::POST, REGISTER_PATH, Some(token)).json(form);
        self.send(builder).await?;
        Ok(())
    }

    async fn modify_user(&self, token: &str, id: &str, form: &UserForm) -> Result<(), ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &modify_user_path(id)?, Some(token))
            .json(form);
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, &delete_user_path(id)?, Some(token)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
