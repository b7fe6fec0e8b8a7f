//! Taxonomie des erreurs de résolution
//!
//! Chaque variante identifie l'étape du pipeline qui a échoué et pour
//! quel identifiant. Le type est `Clone` : en cas de coalescence
//! single-flight, tous les appelants en attente reçoivent la même issue.

use pfysource::SourceError;
use thiserror::Error;

/// Type Result personnalisé pour pfyresolver
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Erreurs possibles lors de la résolution d'une piste
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Identifiant malformé : rejeté avant toute E/S
    #[error("Invalid track id: {0:?}")]
    InvalidId(String),

    /// La source ne connaît aucun contenu pour cet identifiant
    #[error("Track not found: {0}")]
    NotFound(String),

    /// La source est joignable mais le transfert a échoué
    /// (un transfert partiel n'est jamais un succès)
    #[error("Upstream fetch failed for {id}: {reason}")]
    UpstreamFetch { id: String, reason: String },

    /// L'upload vers le stockage durable a échoué
    /// (rejouable : les uploads sont des upserts par clé)
    #[error("Storage upload failed for {id}: {reason}")]
    Storage { id: String, reason: String },

    /// L'écriture des métadonnées a échoué après un upload réussi
    ///
    /// Succès dégradé : l'URL durable est quand même retournée à
    /// l'appelant, cette erreur n'est émise que vers l'observabilité.
    #[error("Metadata persistence failed for {id}: {reason}")]
    Persistence { id: String, reason: String },
}

impl ResolveError {
    /// Enveloppe une erreur de la source avec le contexte du pipeline
    pub fn from_source(id: &str, err: SourceError) -> Self {
        match err {
            SourceError::NotFound(_) => Self::NotFound(id.to_string()),
            other => Self::UpstreamFetch {
                id: id.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
