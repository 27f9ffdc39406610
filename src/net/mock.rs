//! Recording in-memory backend for controller and session tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::api::{ApiError, Backend};
use super::types::{
    Credentials, Demande, DemandeStats, DemandeStatus, Domaine, LoginResponse, Municipalite, NewDemande,
    NewMunicipalite, RequestType, Statut, User, UserForm,
};

/// One backend call as observed by the mock.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Login(String),
    Logout(String),
    PasswordReset(String),
    ListDemandes,
    SubmitDemande(String),
    TrackDemande(String),
    UpdateStatut(String, Statut),
    DeleteDemande(String),
    Stats,
    ListMunicipalites { authenticated: bool },
    CreateMunicipalite(String),
    UpdateMunicipalite(String, String),
    DeleteMunicipalite(String),
    ListUsers,
    RegisterUser(String),
    ModifyUser(String, String),
    DeleteUser(String),
}

/// Shape-level failure injected for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Respond with a 500.
    Server,
    /// Respond with JSON that is not the expected collection.
    Malformed,
}

pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub tokens: Mutex<Vec<Option<String>>>,
    pub login_response: Mutex<Result<LoginResponse, u16>>,
    pub demandes: Mutex<Vec<Demande>>,
    pub municipalites: Mutex<Vec<Municipalite>>,
    pub users: Mutex<Vec<User>>,
    faults: Mutex<Vec<(&'static str, Fault)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            login_response: Mutex::new(Err(401)),
            demandes: Mutex::new(Vec::new()),
            municipalites: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn with_login(self, response: LoginResponse) -> Self {
        *self.login_response.lock().unwrap() = Ok(response);
        self
    }

    pub fn with_demandes(self, demandes: Vec<Demande>) -> Self {
        *self.demandes.lock().unwrap() = demandes;
        self
    }

    pub fn with_municipalites(self, municipalites: Vec<Municipalite>) -> Self {
        *self.municipalites.lock().unwrap() = municipalites;
        self
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.lock().unwrap() = users;
        self
    }

    /// Make `op` (the trait method name) fail with `fault` from now on.
    pub fn fail(&self, op: &'static str, fault: Fault) {
        self.faults.lock().unwrap().push((op, fault));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &Call) -> bool {
        self.calls.lock().unwrap().contains(call)
    }

    fn record(&self, call: Call, token: Option<&str>) {
        self.calls.lock().unwrap().push(call);
        self.tokens.lock().unwrap().push(token.map(str::to_owned));
    }

    fn check(&self, op: &'static str) -> Result<(), ApiError> {
        let faults = self.faults.lock().unwrap();
        match faults.iter().rev().find(|(name, _)| *name == op).map(|(_, f)| *f) {
            Some(Fault::Server) => Err(ApiError::Status { status: 500, body: "{\"error\":\"boom\"}".into() }),
            Some(Fault::Malformed) => Err(ApiError::UnexpectedShape("array")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login(credentials.email.clone()), None);
        self.check("login")?;
        self.login_response
            .lock()
            .unwrap()
            .clone()
            .map_err(|status| ApiError::Status { status, body: "{\"detail\":\"invalid credentials\"}".into() })
    }

    async fn logout(&self, token: &str, refresh: &str) -> Result<(), ApiError> {
        self.record(Call::Logout(refresh.to_owned()), Some(token));
        self.check("logout")
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        self.record(Call::PasswordReset(email.to_owned()), None);
        self.check("request_password_reset")
    }

    async fn list_demandes(&self, token: &str) -> Result<Vec<Demande>, ApiError> {
        self.record(Call::ListDemandes, Some(token));
        self.check("list_demandes")?;
        Ok(self.demandes.lock().unwrap().clone())
    }

    async fn submit_demande(&self, demande: &NewDemande) -> Result<Demande, ApiError> {
        self.record(Call::SubmitDemande(demande.titre.clone()), None);
        self.check("submit_demande")?;
        let municipalite = self
            .municipalites
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.name_francais == demande.municipalite)
            .cloned()
            .ok_or_else(|| ApiError::Status { status: 400, body: "{\"municipalite\":[\"unknown\"]}".into() })?;
        let mut demandes = self.demandes.lock().unwrap();
        let created = Demande {
            id: format!("d{}", demandes.len() + 1),
            nom_complet: demande.nom_complet.clone(),
            email: demande.email.clone(),
            telephone: demande.telephone.clone(),
            adresse: demande.adresse.clone(),
            request_type: demande.request_type,
            domaine: demande.domaine,
            municipalite,
            titre: demande.titre.clone(),
            description: demande.description.clone(),
            piece_jointe: None,
            key: Some("K7Q2ZP".into()),
            statut: Statut::NonTraite,
        };
        demandes.push(created.clone());
        Ok(created)
    }

    async fn track_demande(&self, key: &str) -> Result<DemandeStatus, ApiError> {
        self.record(Call::TrackDemande(key.to_owned()), None);
        self.check("track_demande")?;
        self.demandes
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.key.as_deref() == Some(key))
            .map(|d| DemandeStatus { titre: d.titre.clone(), key: d.key.clone(), statut: d.statut })
            .ok_or_else(|| ApiError::Status { status: 404, body: "{\"error\":\"Demande not found\"}".into() })
    }

    async fn update_statut(&self, token: &str, id: &str, statut: Statut) -> Result<(), ApiError> {
        self.record(Call::UpdateStatut(id.to_owned(), statut), Some(token));
        self.check("update_statut")?;
        if let Some(d) = self.demandes.lock().unwrap().iter_mut().find(|d| d.id == id) {
            d.statut = statut;
        }
        Ok(())
    }

    async fn delete_demande(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.record(Call::DeleteDemande(id.to_owned()), Some(token));
        self.check("delete_demande")?;
        self.demandes.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn demande_stats(&self, token: &str) -> Result<DemandeStats, ApiError> {
        self.record(Call::Stats, Some(token));
        self.check("demande_stats")?;
        let demandes = self.demandes.lock().unwrap();
        let total = demandes.len() as u64;
        let traitees = demandes.iter().filter(|d| d.statut == Statut::Traite).count() as u64;
        #[allow(clippy::cast_precision_loss)]
        let taux_traitement = if total == 0 { 0.0 } else { (traitees as f64 / total as f64 * 10_000.0).round() / 100.0 };
        Ok(DemandeStats { total, traitees, taux_traitement })
    }

    async fn list_municipalites(&self, token: Option<&str>) -> Result<Vec<Municipalite>, ApiError> {
        self.record(Call::ListMunicipalites { authenticated: token.is_some() }, token);
        self.check("list_municipalites")?;
        Ok(self.municipalites.lock().unwrap().clone())
    }

    async fn create_municipalite(&self, token: &str, municipalite: &NewMunicipalite) -> Result<Municipalite, ApiError> {
        self.record(Call::CreateMunicipalite(municipalite.name_francais.clone()), Some(token));
        self.check("create_municipalite")?;
        let mut list = self.municipalites.lock().unwrap();
        let created = Municipalite { id: format!("m{}", list.len() + 1), name_francais: municipalite.name_francais.clone() };
        list.push(created.clone());
        Ok(created)
    }

    async fn update_municipalite(&self, token: &str, municipalite: &Municipalite) -> Result<Municipalite, ApiError> {
        self.record(
            Call::UpdateMunicipalite(municipalite.id.clone(), municipalite.name_francais.clone()),
            Some(token),
        );
        self.check("update_municipalite")?;
        if let Some(m) = self.municipalites.lock().unwrap().iter_mut().find(|m| m.id == municipalite.id) {
            m.name_francais.clone_from(&municipalite.name_francais);
        }
        Ok(municipalite.clone())
    }

    async fn delete_municipalite(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.record(Call::DeleteMunicipalite(id.to_owned()), Some(token));
        self.check("delete_municipalite")?;
        self.municipalites.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.record(Call::ListUsers, Some(token));
        self.check("list_users")?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn register_user(&self, token: &str, form: &UserForm) -> Result<(), ApiError> {
        self.record(Call::RegisterUser(form.email.clone()), Some(token));
        self.check("register_user")?;
        let mut users = self.users.lock().unwrap();
        let id = (users.len() + 1).to_string();
        users.push(user_from_form(id, form));
        Ok(())
    }

    async fn modify_user(&self, token: &str, id: &str, form: &UserForm) -> Result<(), ApiError> {
        self.record(Call::ModifyUser(id.to_owned(), form.email.clone()), Some(token));
        self.check("modify_user")?;
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            *u = user_from_form(id.to_owned(), form);
        }
        Ok(())
    }

    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.record(Call::DeleteUser(id.to_owned()), Some(token));
        self.check("delete_user")?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

fn user_from_form(id: String, form: &UserForm) -> User {
    User {
        id,
        nom: form.nom.clone(),
        prenom: form.prenom.clone(),
        email: form.email.clone(),
        numero_telephone: form.numero_telephone.clone(),
        role: form
            .role
            .and_then(|role| serde_json::to_value(role).ok())
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default(),
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn login_payload(access: &str, refresh: &str, groups: &[&str]) -> LoginResponse {
    LoginResponse {
        access: Some(access.to_owned()),
        refresh: Some(refresh.to_owned()),
        email: Some("a@b.com".to_owned()),
        groups: Some(groups.iter().map(|g| (*g).to_owned()).collect()),
        permissions: Vec::new(),
    }
}

pub fn municipalite(id: &str, name: &str) -> Municipalite {
    Municipalite { id: id.to_owned(), name_francais: name.to_owned() }
}

pub fn demande(id: &str, titre: &str, statut: Statut) -> Demande {
    Demande {
        id: id.to_owned(),
        nom_complet: "Amal Trabelsi".to_owned(),
        email: "amal@example.com".to_owned(),
        telephone: "22111222".to_owned(),
        adresse: "1 rue de Carthage".to_owned(),
        request_type: RequestType::Reclamation,
        domaine: Domaine::Infrastructure,
        municipalite: municipalite("m1", "Sousse"),
        titre: titre.to_owned(),
        description: "Nid de poule".to_owned(),
        piece_jointe: None,
        key: Some(format!("KEY{id}")),
        statut,
    }
}

pub fn user(id: &str, nom: &str, role: &str) -> User {
    User {
        id: id.to_owned(),
        nom: nom.to_owned(),
        prenom: "Sami".to_owned(),
        email: format!("{}@commune.tn", nom.to_lowercase()),
        numero_telephone: "12345678".to_owned(),
        role: role.to_owned(),
    }
}
