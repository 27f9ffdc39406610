//! Client for the municipal citizen-request portal.
//!
//! ARCHITECTURE
//! ============
//! Staff (admin/superadmin) manage demandes, municipalities and accounts;
//! citizens submit and track demandes anonymously. Every operation is a
//! round-trip against the fixed REST backend, so the crate is organised
//! around the pieces that carry client-side state:
//!
//! - [`store`]: persisted key/value storage for the session payload.
//! - [`session`]: the single owner of the authenticated session.
//! - [`routes`]: navigation table and the route guard.
//! - [`views`]: role-gated controllers for each page.
//! - [`net`]: wire types and the backend client.
//! - [`filter`], [`forms`]: client-side search and form rules.
//! - [`config`], [`i18n`]: environment configuration and notice text.
//!
//! The `portail` binary drives these controllers from the command line.

pub mod config;
pub mod filter;
pub mod forms;
pub mod i18n;
pub mod net;
pub mod routes;
pub mod session;
pub mod store;
pub mod views;
