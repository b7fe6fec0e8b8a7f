//! Gestion des erreurs pour les sources de contenu

use thiserror::Error;

/// Type Result personnalisé pour pfysource
pub type Result<T> = std::result::Result<T, SourceError>;

/// Erreurs possibles lors de l'accès à une source de contenu
#[derive(Error, Debug)]
pub enum SourceError {
    /// La source ne connaît aucun contenu pour cet identifiant
    #[error("Track not found: {0}")]
    NotFound(String),

    /// La source est joignable mais le transfert a échoué
    /// (statut d'erreur, interruption en cours de flux, etc.)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Erreur HTTP bas-niveau (réseau, timeout, DNS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SourceError {
    /// Crée une erreur depuis un code de statut HTTP et un contexte
    pub fn from_status_code(code: u16, context: impl Into<String>) -> Self {
        match code {
            404 => Self::NotFound(context.into()),
            _ => Self::Upstream(format!("HTTP {} for {}", code, context.into())),
        }
    }
}
