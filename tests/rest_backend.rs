//! `RestBackend` against a local axum stub: paths, bearer header, bodies and
//! error mapping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Json;
use serde_json::{Value, json};

use portail::net::types::{Credentials, Municipalite, NewMunicipalite, Role, Statut, UserForm};
use portail::net::{ApiError, Backend, HttpTimeouts, RestBackend};

#[derive(Clone, Debug)]
struct Seen {
    route: String,
    bearer: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Stub {
    fn respond(&self, route: &str, status: u16, payload: Value) {
        self.responses.lock().unwrap().insert(route.to_owned(), (status, payload));
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn handle(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let route = format!("{method} {}", uri.path());
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    stub.seen.lock().unwrap().push(Seen { route: route.clone(), bearer, body });

    let (status, payload) = stub
        .responses
        .lock()
        .unwrap()
        .get(&route)
        .cloned()
        .unwrap_or((404, json!({ "error": "not found" })));
    (StatusCode::from_u16(status).unwrap(), Json(payload))
}

async fn start() -> (RestBackend, Stub) {
    let stub = Stub::default();
    let app = Router::new().fallback(handle).with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let backend = RestBackend::new(&format!("http://{addr}/"), HttpTimeouts::default()).unwrap();
    (backend, stub)
}

fn demande_json(id: &str, statut: &str) -> Value {
    json!({
        "id": id,
        "nom_complet": "Amal Trabelsi",
        "email": "amal@example.com",
        "telephone": "22111222",
        "adresse": "1 rue de Carthage",
        "request_type": "Reclamation",
        "domaine": "Eclairage public",
        "municipalite": { "id": "8b0c", "name_francais": "Sousse" },
        "titre": "Lampadaire",
        "description": "En panne",
        "piece_jointe": null,
        "key": "A1B2C3",
        "statut": statut
    })
}

#[tokio::test]
async fn login_posts_credentials_without_auth() {
    let (backend, stub) = start().await;
    stub.respond(
        "POST /authentification/users/login/",
        200,
        json!({ "access": "T1", "refresh": "T2", "email": "a@b.com", "groups": ["admin"], "permissions": [] }),
    );

    let response = backend
        .login(&Credentials { email: "a@b.com".into(), password: "secret".into() })
        .await
        .unwrap();

    assert_eq!(response.access.as_deref(), Some("T1"));
    assert_eq!(response.groups, Some(vec!["admin".to_owned()]));
    let seen = stub.seen();
    assert_eq!(seen[0].bearer, None);
    assert_eq!(seen[0].body, json!({ "email": "a@b.com", "password": "secret" }));
}

#[tokio::test]
async fn rejected_login_carries_status_and_body() {
    let (backend, stub) = start().await;
    stub.respond("POST /authentification/users/login/", 401, json!({ "detail": "invalid credentials" }));

    let err = backend
        .login(&Credentials { email: "a@b.com".into(), password: "wrong!".into() })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    match err {
        ApiError::Status { body, .. } => assert!(body.contains("invalid credentials")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn list_demandes_sends_bearer_and_decodes() {
    let (backend, stub) = start().await;
    stub.respond("GET /demandes/", 200, json!([demande_json("3f2a", "en cours")]));

    let demandes = backend.list_demandes("T1").await.unwrap();

    assert_eq!(demandes.len(), 1);
    assert_eq!(demandes[0].statut, Statut::EnCours);
    assert_eq!(demandes[0].municipalite.name_francais, "Sousse");
    assert_eq!(stub.seen()[0].bearer.as_deref(), Some("Bearer T1"));
}

#[tokio::test]
async fn non_array_list_is_unexpected_shape() {
    let (backend, stub) = start().await;
    stub.respond("GET /demandes/", 200, json!({ "detail": "paginated" }));

    let err = backend.list_demandes("T1").await.unwrap_err();

    assert!(matches!(err, ApiError::UnexpectedShape(_)));
}

#[tokio::test]
async fn update_statut_puts_wire_value() {
    let (backend, stub) = start().await;
    stub.respond("PUT /demandes/3f2a/", 200, demande_json("3f2a", "traité"));

    backend.update_statut("T1", "3f2a", Statut::Traite).await.unwrap();

    let seen = stub.seen();
    assert_eq!(seen[0].route, "PUT /demandes/3f2a/");
    assert_eq!(seen[0].body, json!({ "statut": "traité" }));
}

#[tokio::test]
async fn delete_failure_maps_to_status() {
    let (backend, _stub) = start().await;

    let err = backend.delete_demande("T1", "missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn public_municipalites_are_anonymous() {
    let (backend, stub) = start().await;
    stub.respond("GET /municipalites/", 200, json!([{ "id": "m1", "name_francais": "Sousse" }]));

    let list = backend.list_municipalites(None).await.unwrap();

    assert_eq!(list, vec![Municipalite { id: "m1".into(), name_francais: "Sousse".into() }]);
    assert_eq!(stub.seen()[0].bearer, None);
}

#[tokio::test]
async fn municipalite_crud_paths() {
    let (backend, stub) = start().await;
    stub.respond("POST /municipalites/", 201, json!({ "id": "m9", "name_francais": "Tunis" }));
    stub.respond("PUT /municipalites/m9/", 200, json!({ "id": "m9", "name_francais": "Tunis Centre" }));
    stub.respond("DELETE /municipalites/m9/", 200, Value::Null);

    let created = backend
        .create_municipalite("T1", &NewMunicipalite { name_francais: "Tunis".into() })
        .await
        .unwrap();
    backend
        .update_municipalite("T1", &Municipalite { id: created.id.clone(), name_francais: "Tunis Centre".into() })
        .await
        .unwrap();
    backend.delete_municipalite("T1", &created.id).await.unwrap();

    let routes: Vec<_> = stub.seen().into_iter().map(|s| s.route).collect();
    assert_eq!(routes, ["POST /municipalites/", "PUT /municipalites/m9/", "DELETE /municipalites/m9/"]);
}

#[tokio::test]
async fn users_listing_unwraps_envelope_with_integer_ids() {
    let (backend, stub) = start().await;
    stub.respond(
        "GET /authentification/users/affiche/",
        200,
        json!({ "users": [{ "id": 4, "nom": "Gharbi", "prenom": "Sami", "email": "g@commune.tn",
                            "numero_telephone": "12345678", "role": "superadmin" }] }),
    );

    let users = backend.list_users("T1").await.unwrap();

    assert_eq!(users[0].id, "4");
    assert_eq!(users[0].role, "superadmin");
}

#[tokio::test]
async fn users_listing_without_array_is_unexpected_shape() {
    let (backend, stub) = start().await;
    stub.respond("GET /authentification/users/affiche/", 200, json!({ "users": "none" }));

    assert!(matches!(backend.list_users("T1").await, Err(ApiError::UnexpectedShape(_))));
}

#[tokio::test]
async fn modify_user_puts_full_form() {
    let (backend, stub) = start().await;
    stub.respond("PUT /authentification/users/modifier/4/", 200, json!({ "message": "ok" }));
    let form = UserForm {
        nom: "Gharbi".into(),
        prenom: "Sami".into(),
        email: "g@commune.tn".into(),
        password: "secret1".into(),
        role: Some(Role::Admin),
        numero_telephone: "12345678".into(),
    };

    backend.modify_user("T1", "4", &form).await.unwrap();

    assert_eq!(stub.seen()[0].body["role"], "admin");
    assert_eq!(stub.seen()[0].body["numero_telephone"], "12345678");
}

#[tokio::test]
async fn stats_combine_three_endpoints() {
    let (backend, stub) = start().await;
    stub.respond("GET /demandes/total/", 200, json!({ "total_demandes": 12 }));
    stub.respond("GET /demandes/traite/", 200, json!({ "total_demandes_traitees": 3 }));
    stub.respond("GET /demandes/taux-traitement/", 200, json!({ "taux_traitement": 25.0 }));

    let stats = backend.demande_stats("T1").await.unwrap();

    assert_eq!((stats.total, stats.traitees), (12, 3));
    assert!((stats.taux_traitement - 25.0).abs() < f64::EPSILON);
    assert_eq!(stub.seen().len(), 3);
}

#[tokio::test]
async fn track_is_public_lookup_by_key() {
    let (backend, stub) = start().await;
    stub.respond("GET /demandes/A1B2C3/", 200, json!({ "titre": "Lampadaire", "key": "A1B2C3", "statut": "non traité" }));

    let status = backend.track_demande("A1B2C3").await.unwrap();

    assert_eq!(status.statut, Statut::NonTraite);
    assert_eq!(stub.seen()[0].bearer, None);
}

#[tokio::test]
async fn tracking_key_with_path_syntax_is_one_segment() {
    let (backend, stub) = start().await;

    let err = backend.track_demande("../municipalites?x=1").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(stub.seen()[0].route, "GET /demandes/..%2Fmunicipalites%3Fx%3D1/");
}

#[tokio::test]
async fn logout_sends_refresh_token() {
    let (backend, stub) = start().await;
    stub.respond("POST /authentification/users/logout/", 200, Value::Null);

    backend.logout("T1", "R1").await.unwrap();

    assert_eq!(stub.seen()[0].body, json!({ "refresh": "R1" }));
    assert_eq!(stub.seen()[0].bearer.as_deref(), Some("Bearer T1"));
}
