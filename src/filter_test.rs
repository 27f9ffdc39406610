use super::*;
use crate::net::mock::{demande, user};
use crate::net::types::Statut;

#[derive(Serialize)]
struct Row {
    id: u32,
    name: &'static str,
    note: Option<&'static str>,
    active: bool,
}

fn rows() -> Vec<Row> {
    vec![
        Row { id: 17, name: "Sousse", note: None, active: true },
        Row { id: 42, name: "Monastir", note: Some("Côte Est"), active: false },
    ]
}

#[test]
fn empty_term_keeps_all_rows() {
    let rows = rows();
    assert_eq!(filter_rows(&rows, "").len(), 2);
}

#[test]
fn spaces_in_the_term_are_matched_literally() {
    let rows = rows();
    assert_eq!(filter_rows(&rows, "   ").len(), 0);
    assert_eq!(filter_rows(&rows, " est")[0].name, "Monastir");
    assert!(filter_rows(&rows, " sous").is_empty());
}

#[test]
fn match_is_case_insensitive() {
    let rows = rows();
    let hits = filter_rows(&rows, "SOUS");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 17);
}

#[test]
fn numbers_and_booleans_match_their_display_form() {
    let rows = rows();
    assert_eq!(filter_rows(&rows, "42")[0].name, "Monastir");
    assert_eq!(filter_rows(&rows, "fals")[0].name, "Monastir");
}

#[test]
fn nulls_never_match() {
    let rows = rows();
    assert!(filter_rows(&rows, "null").is_empty());
}

#[test]
fn non_ascii_content_matches() {
    let rows = rows();
    assert_eq!(filter_rows(&rows, "côte").len(), 1);
}

#[test]
fn demandes_match_on_status_and_nested_municipality() {
    let demandes = vec![
        demande("d1", "Lampadaire", Statut::Traite),
        demande("d2", "Trottoir", Statut::EnCours),
    ];
    assert_eq!(filter_rows(&demandes, "en cours")[0].id, "d2");
    assert_eq!(filter_rows(&demandes, "sousse").len(), 2);
    assert!(filter_rows(&demandes, "tunis").is_empty());
}

#[test]
fn users_match_on_any_column() {
    let users = vec![user("1", "Trabelsi", "admin"), user("2", "Ben Ali", "superadmin")];
    assert_eq!(filter_rows(&users, "SUPER")[0].id, "2");
    assert_eq!(filter_rows(&users, "trabelsi@").len(), 1);
}
