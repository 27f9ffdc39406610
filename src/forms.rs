//! Client-side form rules, applied before any request leaves the client.
//!
//! The backend validates again; these checks exist so obviously invalid input
//! gets the same immediate feedback the web forms give.

use crate::net::types::{NewDemande, UserForm};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PHONE_DIGITS: usize = 8;

/// Reason a form was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("`{0}` is required")]
    Required(&'static str),
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("phone number must be exactly 8 digits")]
    InvalidPhone,
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
#[must_use]
pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Login form: email required and well-formed, password at least six chars.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), FormError> {
    if email.trim().is_empty() {
        return Err(FormError::Required("email"));
    }
    if !is_valid_email(email.trim()) {
        return Err(FormError::InvalidEmail);
    }
    if password.is_empty() {
        return Err(FormError::Required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort);
    }
    Ok(())
}

/// Staff account form: every field required, including an explicitly chosen
/// role.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn validate_user_form(form: &UserForm) -> Result<(), FormError> {
    require("nom", &form.nom)?;
    require("prenom", &form.prenom)?;
    require("email", &form.email)?;
    if !is_valid_email(form.email.trim()) {
        return Err(FormError::InvalidEmail);
    }
    require("password", &form.password)?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort);
    }
    if form.role.is_none() {
        return Err(FormError::Required("role"));
    }
    let phone = form.numero_telephone.trim();
    if phone.len() != PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormError::InvalidPhone);
    }
    Ok(())
}

/// Citizen submission form.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn validate_new_demande(demande: &NewDemande) -> Result<(), FormError> {
    require("nom_complet", &demande.nom_complet)?;
    require("email", &demande.email)?;
    if !is_valid_email(demande.email.trim()) {
        return Err(FormError::InvalidEmail);
    }
    require("telephone", &demande.telephone)?;
    require("adresse", &demande.adresse)?;
    require("municipalite", &demande.municipalite)?;
    require("titre", &demande.titre)?;
    require("description", &demande.description)?;
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

#[cfg(test)]
#[path = "forms_test.rs"]
mod tests;
