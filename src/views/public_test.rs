use super::*;
use crate::net::mock::{Call, Fault, MockBackend, demande, municipalite};
use crate::net::types::{Domaine, RequestType, Statut};
use crate::views::test_support::context;

fn new_demande(municipalite: &str) -> NewDemande {
    NewDemande {
        nom_complet: "Amal Trabelsi".into(),
        email: "amal@example.com".into(),
        telephone: "22111222".into(),
        adresse: "1 rue de Carthage".into(),
        request_type: RequestType::Suggestion,
        domaine: Domaine::EclairagePublic,
        municipalite: municipalite.into(),
        titre: "Plus de lampadaires".into(),
        description: "Rue sombre la nuit".into(),
    }
}

// =============================================================================
// submission
// =============================================================================

#[tokio::test]
async fn submission_loads_municipalites_anonymously() {
    let (ctx, mock) = context(MockBackend::new().with_municipalites(vec![municipalite("m1", "Sousse")]), None);
    let mut view = SubmissionView::new(ctx);

    view.load().await;

    assert_eq!(view.municipalites().len(), 1);
    assert_eq!(mock.calls(), vec![Call::ListMunicipalites { authenticated: false }]);
}

#[tokio::test]
async fn submit_returns_tracking_key() {
    let (ctx, mock) = context(MockBackend::new().with_municipalites(vec![municipalite("m1", "Sousse")]), None);
    let mut view = SubmissionView::new(ctx);
    view.load().await;

    let key = view.submit(&new_demande("Sousse")).await.unwrap();

    assert_eq!(key.as_deref(), Some("K7Q2ZP"));
    assert_eq!(view.tracking_key(), Some("K7Q2ZP"));
    assert!(mock.called(&Call::SubmitDemande("Plus de lampadaires".into())));
    assert_eq!(view.notices(), &[Notice::Success("Votre demande a été soumise avec succès.".into())]);
}

#[tokio::test]
async fn submit_rejects_incomplete_form_locally() {
    let (ctx, mock) = context(MockBackend::new(), None);
    let mut view = SubmissionView::new(ctx);
    let mut incomplete = new_demande("Sousse");
    incomplete.titre = " ".into();

    let err = view.submit(&incomplete).await.unwrap_err();

    assert!(matches!(err, ViewError::InvalidForm(FormError::Required("titre"))));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn submit_rejects_unknown_municipality_once_list_is_loaded() {
    let (ctx, mock) = context(MockBackend::new().with_municipalites(vec![municipalite("m1", "Sousse")]), None);
    let mut view = SubmissionView::new(ctx);
    view.load().await;

    let err = view.submit(&new_demande("Atlantis")).await.unwrap_err();

    assert!(matches!(err, ViewError::InvalidForm(FormError::Required("municipalite"))));
    assert!(!mock.calls().iter().any(|c| matches!(c, Call::SubmitDemande(_))));
}

#[tokio::test]
async fn backend_rejection_becomes_notice() {
    let (ctx, _) = context(MockBackend::new(), None);
    let mut view = SubmissionView::new(ctx);

    let key = view.submit(&new_demande("Sousse")).await.unwrap();

    assert_eq!(key, None);
    assert_eq!(view.notices()[0].text(), "Erreur lors de l’envoi de la demande.");
}

// =============================================================================
// tracking
// =============================================================================

#[tokio::test]
async fn track_finds_demande_by_key() {
    let (ctx, _) = context(MockBackend::new().with_demandes(vec![demande("d9", "Fuite", Statut::EnCours)]), None);
    let mut view = TrackingView::new(ctx);

    let found = view.track(" KEYd9 ").await.unwrap().cloned().unwrap();

    assert_eq!(found.titre, "Fuite");
    assert_eq!(found.statut, Statut::EnCours);
}

#[tokio::test]
async fn unknown_key_raises_not_found_notice() {
    let (ctx, _) = context(MockBackend::new(), None);
    let mut view = TrackingView::new(ctx);

    assert!(view.track("ZZZZZZ").await.unwrap().is_none());
    assert_eq!(view.notices()[0].text(), "Aucune demande ne correspond à cette clé.");
}

#[tokio::test]
async fn blank_key_is_rejected() {
    let (ctx, mock) = context(MockBackend::new(), None);
    let mut view = TrackingView::new(ctx);
    assert!(matches!(view.track("  ").await, Err(ViewError::InvalidForm(_))));
    assert!(mock.calls().is_empty());
}

// =============================================================================
// password reset
// =============================================================================

#[tokio::test]
async fn reset_request_is_sent() {
    let (ctx, mock) = context(MockBackend::new(), None);
    let mut view = PasswordResetView::new(ctx);

    assert!(view.request("agent@commune.tn").await.unwrap());
    assert!(mock.called(&Call::PasswordReset("agent@commune.tn".into())));
    assert!(!view.notices()[0].is_error());
}

#[tokio::test]
async fn reset_rejects_malformed_email() {
    let (ctx, mock) = context(MockBackend::new(), None);
    let mut view = PasswordResetView::new(ctx);
    assert!(matches!(view.request("agent").await, Err(ViewError::InvalidForm(FormError::InvalidEmail))));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn reset_failure_becomes_notice() {
    let (ctx, mock) = context(MockBackend::new(), None);
    mock.fail("request_password_reset", Fault::Server);
    let mut view = PasswordResetView::new(ctx);

    assert!(!view.request("agent@commune.tn").await.unwrap());
    assert!(view.notices()[0].is_error());
}
