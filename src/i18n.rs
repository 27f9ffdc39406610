//! User-facing notice text in French (default) and English.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    Fr,
    En,
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language '{other}' (expected 'fr' or 'en')")),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fr => "fr",
            Self::En => "en",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Error,
    Oops,
    InvalidCredentials,
    MissingTokens,
    InvalidForm,
    StatusUpdated,
    ErrorUpdatingStatus,
    DemandeDeleted,
    ErrorDeletingDemande,
    MunicipalityAdded,
    MunicipalityUpdated,
    MunicipalityDeleted,
    ErrorAddingMunicipality,
    ErrorUpdatingMunicipality,
    ErrorDeletingMunicipality,
    ErrorFetchingMunicipalities,
    UserAdded,
    UserUpdated,
    UserDeleted,
    ErrorAddingUser,
    ErrorUpdatingUser,
    ErrorDeletingUser,
    DemandeSubmitted,
    ErrorSubmittingDemande,
    DemandeNotFound,
    PasswordResetSent,
    ErrorPasswordReset,
    ErrorFetchingStatistics,
}

impl MessageKey {
    #[must_use]
    pub fn text(self, lang: Lang) -> &'static str {
        match lang {
            Lang::Fr => self.fr(),
            Lang::En => self.en(),
        }
    }

    fn fr(self) -> &'static str {
        match self {
            Self::Error => "Erreur",
            Self::Oops => "Oups...",
            Self::InvalidCredentials => "Nom d’utilisateur ou mot de passe incorrect.",
            Self::MissingTokens => "Tokens manquants dans la réponse du serveur.",
            Self::InvalidForm => "Veuillez remplir tous les champs correctement.",
            Self::StatusUpdated => "Statut mis à jour avec succès.",
            Self::ErrorUpdatingStatus => "Erreur lors de la mise à jour du statut.",
            Self::DemandeDeleted => "Demande supprimée avec succès.",
            Self::ErrorDeletingDemande => "Erreur lors de la suppression de la demande.",
            Self::MunicipalityAdded => "Municipalité ajoutée avec succès.",
            Self::MunicipalityUpdated => "Municipalité modifiée avec succès.",
            Self::MunicipalityDeleted => "Municipalité supprimée avec succès.",
            Self::ErrorAddingMunicipality => "Erreur lors de l’ajout de la municipalité.",
            Self::ErrorUpdatingMunicipality => "Erreur lors de la modification de la municipalité.",
            Self::ErrorDeletingMunicipality => "Erreur lors de la suppression de la municipalité.",
            Self::ErrorFetchingMunicipalities => "Erreur lors du chargement des municipalités.",
            Self::UserAdded => "Utilisateur ajouté avec succès.",
            Self::UserUpdated => "Utilisateur modifié avec succès.",
            Self::UserDeleted => "Utilisateur supprimé avec succès.",
            Self::ErrorAddingUser => "Erreur lors de l’ajout de l’utilisateur.",
            Self::ErrorUpdatingUser => "Erreur lors de la modification de l’utilisateur.",
            Self::ErrorDeletingUser => "Erreur lors de la suppression de l’utilisateur.",
            Self::DemandeSubmitted => "Votre demande a été soumise avec succès.",
            Self::ErrorSubmittingDemande => "Erreur lors de l’envoi de la demande.",
            Self::DemandeNotFound => "Aucune demande ne correspond à cette clé.",
            Self::PasswordResetSent => "Un e-mail de réinitialisation a été envoyé.",
            Self::ErrorPasswordReset => "Impossible d’envoyer l’e-mail de réinitialisation.",
            Self::ErrorFetchingStatistics => "Erreur lors du chargement des statistiques.",
        }
    }

    fn en(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Oops => "Oops...",
            Self::InvalidCredentials => "Incorrect username or password.",
            Self::MissingTokens => "Tokens missing from the server response.",
            Self::InvalidForm => "Please fill in all fields correctly.",
            Self::StatusUpdated => "Status updated successfully.",
            Self::ErrorUpdatingStatus => "Error while updating the status.",
            Self::DemandeDeleted => "Request deleted successfully.",
            Self::ErrorDeletingDemande => "Error while deleting the request.",
            Self::MunicipalityAdded => "Municipality added successfully.",
            Self::MunicipalityUpdated => "Municipality updated successfully.",
            Self::MunicipalityDeleted => "Municipality deleted successfully.",
            Self::ErrorAddingMunicipality => "Error while adding the municipality.",
            Self::ErrorUpdatingMunicipality => "Error while updating the municipality.",
            Self::ErrorDeletingMunicipality => "Error while deleting the municipality.",
            Self::ErrorFetchingMunicipalities => "Error while loading municipalities.",
            Self::UserAdded => "User added successfully.",
            Self::UserUpdated => "User updated successfully.",
            Self::UserDeleted => "User deleted successfully.",
            Self::ErrorAddingUser => "Error while adding the user.",
            Self::ErrorUpdatingUser => "Error while updating the user.",
            Self::ErrorDeletingUser => "Error while deleting the user.",
            Self::DemandeSubmitted => "Your request was submitted successfully.",
            Self::ErrorSubmittingDemande => "Error while submitting the request.",
            Self::DemandeNotFound => "No request matches this key.",
            Self::PasswordResetSent => "A password reset email has been sent.",
            Self::ErrorPasswordReset => "Could not send the password reset email.",
            Self::ErrorFetchingStatistics => "Error while loading statistics.",
        }
    }
}
