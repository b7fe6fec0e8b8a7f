//! API REST de résolution de pistes
//!
//! Ce module expose l'endpoint de résolution et les routes de service :
//! - Résoudre un identifiant de piste en URL audio durable
//! - Consulter l'état du service (health check)
//! - Bannière d'identification à la racine
//!
//! Toutes les réponses sont enveloppées : `{data, message}` en succès,
//! `{code, message, details}` en erreur. Les codes d'erreur sont
//! stables, le champ `message` est purement descriptif.

use crate::server::ServerInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pfyrepo::TrackRepository;
use pfyresolver::{ResolveError, Resolver};
use pfysource::ContentSource;
use pfystore::BlobStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Enveloppe de succès
#[derive(Debug, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    /// Charge utile de la réponse
    pub data: T,
    /// Message descriptif (jamais contractuel)
    pub message: String,
}

/// Enveloppe d'erreur
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Code d'erreur stable (INVALID_ID, NOT_FOUND, STORAGE_ERROR...)
    pub code: String,
    /// Message descriptif
    pub message: String,
    /// Détails complémentaires éventuels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// URL résolue d'une piste
#[derive(Debug, Serialize, Deserialize)]
pub struct SongUrl {
    /// URL publique durable du fichier audio
    pub url: String,
}

/// Traduit une erreur de résolution en statut HTTP et enveloppe d'erreur
///
/// Les échecs amont et de persistance sont volontairement indistincts
/// côté client (INTERNAL_ERROR) ; seul l'échec d'upload a son propre
/// code, car il est rejouable tel quel.
pub fn error_envelope(err: &ResolveError) -> (StatusCode, ErrorEnvelope) {
    match err {
        ResolveError::InvalidId(id) => (
            StatusCode::BAD_REQUEST,
            ErrorEnvelope {
                code: "INVALID_ID".to_string(),
                message: "Invalid song id".to_string(),
                details: Some(format!(
                    "id {:?} must be non-empty and contain only letters, digits, '_' or '-'",
                    id
                )),
            },
        ),
        ResolveError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            ErrorEnvelope {
                code: "NOT_FOUND".to_string(),
                message: format!("Song '{}' not found", id),
                details: None,
            },
        ),
        ResolveError::Storage { reason, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope {
                code: "STORAGE_ERROR".to_string(),
                message: "Failed to store audio file".to_string(),
                details: Some(reason.clone()),
            },
        ),
        ResolveError::UpstreamFetch { reason, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope {
                code: "INTERNAL_ERROR".to_string(),
                message: "Failed to fetch audio content".to_string(),
                details: Some(reason.clone()),
            },
        ),
        ResolveError::Persistence { reason, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope {
                code: "INTERNAL_ERROR".to_string(),
                message: "Failed to persist song metadata".to_string(),
                details: Some(reason.clone()),
            },
        ),
    }
}

/// Résout l'URL audio durable d'une piste
///
/// Cache hit : l'URL stockée est retournée immédiatement. Cache miss :
/// la réponse attend la fin du pipeline de résolution (fetch, upload,
/// persistance).
pub async fn get_song_url<S, B, R>(
    State(resolver): State<Arc<Resolver<S, B, R>>>,
    Path(id): Path<String>,
) -> impl IntoResponse
where
    S: ContentSource + 'static,
    B: BlobStore + 'static,
    R: TrackRepository + 'static,
{
    debug!(track_id = %id, "GET /song/{{id}}/url");

    match resolver.resolve(&id).await {
        Ok(url) => (
            StatusCode::OK,
            Json(DataEnvelope {
                data: SongUrl { url },
                message: "Song URL resolved successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            let (status, envelope) = error_envelope(&e);
            (status, Json(envelope)).into_response()
        }
    }
}

/// Crée le router de résolution de pistes
///
/// # Arguments
///
/// * `resolver` - Orchestrateur partagé injecté comme état Axum
pub fn create_song_router<S, B, R>(resolver: Arc<Resolver<S, B, R>>) -> Router
where
    S: ContentSource + 'static,
    B: BlobStore + 'static,
    R: TrackRepository + 'static,
{
    Router::new()
        .route("/song/{id}/url", get(get_song_url::<S, B, R>))
        .with_state(resolver)
}

/// État du service
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Secondes écoulées depuis le démarrage
    pub uptime_seconds: u64,
    /// Horodatage RFC3339 de la réponse
    pub timestamp: String,
}

/// Crée les routes de service : bannière racine et health check
pub fn service_router(info: ServerInfo) -> Router {
    let started = Instant::now();

    let banner = serde_json::json!({
        "name": info.name,
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
    });

    Router::new()
        .route(
            "/",
            get(move || {
                let banner = banner.clone();
                async move { Json(banner) }
            }),
        )
        .route(
            "/api/health",
            get(move || async move {
                Json(DataEnvelope {
                    data: HealthStatus {
                        status: "ok".to_string(),
                        uptime_seconds: started.elapsed().as_secs(),
                        timestamp: chrono::Utc::now().to_rfc3339(),
                    },
                    message: "Service is healthy".to_string(),
                })
            }),
        )
}
