//! Wire types shared with the demandes backend.
//!
//! Field names follow the backend's JSON verbatim (French domain vocabulary),
//! so these structs serialize without renames except for enum values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// AUTH
// =============================================================================

/// Body of `POST /authentification/users/login/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login payload returned by the backend.
///
/// Every field is optional on the wire: the session layer decides whether a
/// 2xx payload is usable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

// =============================================================================
// ENUMS
// =============================================================================

/// Processing status of a demande.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statut {
    #[serde(rename = "non traité")]
    NonTraite,
    #[serde(rename = "en cours")]
    EnCours,
    #[serde(rename = "traité")]
    Traite,
}

impl Statut {
    pub const ALL: [Self; 3] = [Self::NonTraite, Self::EnCours, Self::Traite];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonTraite => "non traité",
            Self::EnCours => "en cours",
            Self::Traite => "traité",
        }
    }

    /// Parse the wire value, also accepting unaccented ASCII spellings.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "non traité" | "non traite" | "non-traite" => Some(Self::NonTraite),
            "en cours" | "en-cours" => Some(Self::EnCours),
            "traité" | "traite" => Some(Self::Traite),
            _ => None,
        }
    }
}

impl fmt::Display for Statut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Reclamation,
    Suggestion,
}

impl RequestType {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "reclamation" | "réclamation" => Some(Self::Reclamation),
            "suggestion" => Some(Self::Suggestion),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domaine {
    Infrastructure,
    #[serde(rename = "Santé")]
    Sante,
    Education,
    #[serde(rename = "Propriété")]
    Propriete,
    Transport,
    #[serde(rename = "Eclairage public")]
    EclairagePublic,
    Autre,
}

impl Domaine {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "infrastructure" => Some(Self::Infrastructure),
            "santé" | "sante" => Some(Self::Sante),
            "education" | "éducation" => Some(Self::Education),
            "propriété" | "propriete" => Some(Self::Propriete),
            "transport" => Some(Self::Transport),
            "eclairage public" | "éclairage public" => Some(Self::EclairagePublic),
            "autre" => Some(Self::Autre),
            _ => None,
        }
    }
}

/// Staff role assignable through the users page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Superadmin,
}

impl Role {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "superadmin" => Some(Self::Superadmin),
            _ => None,
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipalite {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name_francais: String,
}

/// Body of `POST /municipalites/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewMunicipalite {
    pub name_francais: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Demande {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub nom_complet: String,
    pub email: String,
    pub telephone: String,
    pub adresse: String,
    pub request_type: RequestType,
    pub domaine: Domaine,
    pub municipalite: Municipalite,
    pub titre: String,
    pub description: String,
    #[serde(default)]
    pub piece_jointe: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub statut: Statut,
}

/// Citizen submission. `municipalite` is the municipality name; the backend
/// resolves it to a record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewDemande {
    pub nom_complet: String,
    pub email: String,
    pub telephone: String,
    pub adresse: String,
    pub request_type: RequestType,
    pub domaine: Domaine,
    pub municipalite: String,
    pub titre: String,
    pub description: String,
}

/// Public tracking view of a demande, looked up by its six-character key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandeStatus {
    pub titre: String,
    #[serde(default)]
    pub key: Option<String>,
    pub statut: Statut,
}

/// Body of `PUT /demandes/{id}/` for status transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatutUpdate {
    pub statut: Statut,
}

/// Staff account as listed by `GET /authentification/users/affiche/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub numero_telephone: String,
    /// Backend reports `"No Role"` for accounts without a group.
    #[serde(default)]
    pub role: String,
}

/// Body of the register and modify user endpoints. `role` stays `None` until
/// one is picked; validation refuses to send the form without it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserForm {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub numero_telephone: String,
}

/// Dashboard counters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DemandeStats {
    pub total: u64,
    pub traitees: u64,
    /// Percentage of processed demandes, two decimals as computed server-side.
    pub taux_traitement: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalResponse {
    pub total_demandes: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TraiteResponse {
    pub total_demandes_traitees: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TauxResponse {
    pub taux_traitement: f64,
}

/// Primary keys are UUID strings for demandes and municipalities but integers
/// for user accounts; both are carried as strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
