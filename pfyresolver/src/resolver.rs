//! Orchestrateur de résolution cache-aside
//!
//! Donne à un identifiant de piste une URL audio durable :
//! consultation du dépôt de métadonnées, et sur cache miss, pipeline
//! fetch → staging → upload → persistance. Les appels concurrents pour
//! un même identifiant non caché sont coalescés : un seul pipeline
//! tourne, tous les appelants partagent son issue.

use crate::error::{ResolveError, Result};
use crate::staging::{StagingArea, StagingSlot};
use futures_util::StreamExt;
use pfyrepo::{TrackRecord, TrackRepository};
use pfysource::{ContentSource, TrackInfo};
use pfystore::BlobStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Période de polling des appelants en attente d'une résolution partagée
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Valide un identifiant de piste
///
/// Autorisés : lettres ASCII, chiffres, underscore, tiret. Tout le
/// reste (vide, `/`, `..`, espaces...) est rejeté avant la moindre E/S.
pub fn valid_track_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Résolution en cours partagée entre tous les appelants d'un même id
///
/// L'issue est publiée une seule fois ; les appelants la lisent par
/// polling (même schéma que l'attente de fin de téléchargement dans le
/// reste du projet). Les attendants gardent leur `Arc` même après le
/// retrait de la map : l'issue leur reste lisible.
struct InFlight {
    outcome: RwLock<Option<Result<String>>>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            outcome: RwLock::new(None),
        }
    }

    /// Publie l'issue pour tous les attendants
    async fn publish(&self, outcome: Result<String>) {
        *self.outcome.write().await = Some(outcome);
    }

    /// Attend l'issue de la résolution
    async fn wait(&self) -> Result<String> {
        loop {
            {
                let outcome = self.outcome.read().await;
                if let Some(result) = &*outcome {
                    return result.clone();
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Orchestrateur de résolution d'identifiants de pistes
///
/// Les collaborateurs sont des handles explicites (traits), jamais des
/// singletons process-wide : l'orchestrateur est substituable par des
/// doubles de test.
///
/// Note : ce type est conçu pour être utilisé derrière un `Arc`.
pub struct Resolver<S, B, R> {
    source: Arc<S>,
    store: Arc<B>,
    repo: Arc<R>,
    staging: Arc<StagingArea>,
    /// Map single-flight des résolutions en cours (id -> InFlight)
    pending: Arc<RwLock<HashMap<String, Arc<InFlight>>>>,
}

impl<S, B, R> Resolver<S, B, R>
where
    S: ContentSource + 'static,
    B: BlobStore + 'static,
    R: TrackRepository + 'static,
{
    /// Crée un orchestrateur avec ses collaborateurs
    pub fn new(source: Arc<S>, store: Arc<B>, repo: Arc<R>, staging: StagingArea) -> Self {
        Self {
            source,
            store,
            repo,
            staging: Arc::new(staging),
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Résout un identifiant de piste en URL audio durable
    ///
    /// # Chemins
    ///
    /// - identifiant invalide : échec immédiat, aucune E/S
    /// - cache hit : URL stockée, aucun appel source/staging/stockage
    /// - cache miss : pipeline complet, coalescé entre appelants
    ///   concurrents du même identifiant
    pub async fn resolve(&self, id: &str) -> Result<String> {
        if !valid_track_id(id) {
            return Err(ResolveError::InvalidId(id.to_string()));
        }

        // Cache lookup : un hit court-circuite tout le pipeline
        match self.repo.get(id).await {
            Ok(Some(record)) => {
                debug!(track_id = id, "Cache hit");
                return Ok(record.url);
            }
            Ok(None) => {}
            Err(e) => {
                // Une lecture en échec dégrade en miss : le pipeline
                // répare ce que le dépôt n'a pas su répondre
                warn!(track_id = id, error = %e, "Cache lookup failed, treating as miss");
            }
        }

        // Single-flight : un seul pipeline par identifiant non caché
        let (flight, leader) = {
            let mut pending = self.pending.write().await;
            match pending.get(id) {
                Some(existing) => {
                    debug!(track_id = id, "Joining in-flight resolution");
                    (existing.clone(), false)
                }
                None => {
                    let flight = Arc::new(InFlight::new());
                    pending.insert(id.to_string(), flight.clone());
                    (flight, true)
                }
            }
        };

        if leader {
            // Tâche détachée : un appelant qui raccroche n'annule pas le
            // pipeline, le cache finit peuplé pour les appels suivants
            let source = self.source.clone();
            let store = self.store.clone();
            let repo = self.repo.clone();
            let staging = self.staging.clone();
            let pending = self.pending.clone();
            let flight = flight.clone();
            let id = id.to_string();

            tokio::spawn(async move {
                let outcome =
                    run_miss(source.as_ref(), store.as_ref(), repo.as_ref(), &staging, &id).await;

                if let Err(e) = &outcome {
                    warn!(track_id = %id, error = %e, "Resolution failed");
                }

                flight.publish(outcome).await;
                pending.write().await.remove(&id);
            });
        }

        flight.wait().await
    }

    /// Nombre de résolutions actuellement en vol
    pub async fn in_flight(&self) -> usize {
        self.pending.read().await.len()
    }
}

/// Pipeline du cache miss : fetch → staging → upload → persistance
///
/// Les étapes sont strictement séquentielles ; aucune ne démarre avant
/// le succès de la précédente. Le slot de staging est relâché par tous
/// les chemins de sortie.
async fn run_miss<S, B, R>(
    source: &S,
    store: &B,
    repo: &R,
    staging: &StagingArea,
    id: &str,
) -> Result<String>
where
    S: ContentSource,
    B: BlobStore,
    R: TrackRepository,
{
    // Re-consultation du dépôt : un vol précédent pour le même id a pu
    // publier et se retirer de la map entre le lookup de l'appelant et
    // son élection comme leader. Le hit évite de rejouer le pipeline.
    if let Ok(Some(record)) = repo.get(id).await {
        debug!(track_id = id, "Already resolved by an earlier flight");
        return Ok(record.url);
    }

    info!(track_id = id, "Cache miss, starting resolution pipeline");

    // 1. Métadonnées amont (dont l'URL du flux audio)
    let info = source
        .track_info(id)
        .await
        .map_err(|e| ResolveError::from_source(id, e))?;

    // 2. Fetch streamé vers le slot de staging
    let slot = staging.slot(id);
    stage_audio(source, &info, &slot).await?;

    // 3. Upload durable sous clé déterministe (upsert)
    let key = format!("{}.mp3", id);
    let url = store
        .upload(slot.path(), &key)
        .await
        .map_err(|e| ResolveError::Storage {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    // 4. Persistance des métadonnées, attendue avant de répondre.
    // Un échec ici est un succès dégradé : l'upload est durable et
    // rejouable, l'URL est retournée quand même.
    let record = TrackRecord {
        id: id.to_string(),
        title: info.title,
        artist: info.artist,
        duration: info.duration,
        small_thumbnail: info.small_thumbnail,
        large_thumbnail: info.large_thumbnail,
        url: url.clone(),
    };

    if let Err(e) = repo.insert(&record).await {
        let persistence = ResolveError::Persistence {
            id: id.to_string(),
            reason: e.to_string(),
        };
        error!(track_id = id, error = %persistence, "Returning durable URL despite failed metadata write");
    } else {
        info!(track_id = id, url = %url, "Track resolved and cached");
    }

    Ok(url)
    // slot relâché ici : fichier stagé supprimé
}

/// Verse le flux audio de la source dans le slot de staging
///
/// Seule une fin de flux propre vaut succès : toute erreur de chunk ou
/// d'écriture interrompt le pipeline et le fichier partiel est jeté par
/// le slot.
async fn stage_audio<S: ContentSource>(
    source: &S,
    info: &TrackInfo,
    slot: &StagingSlot,
) -> Result<()> {
    let id = info.id.as_str();

    let mut stream = source
        .fetch(info)
        .await
        .map_err(|e| ResolveError::from_source(id, e))?;

    let mut file =
        tokio::fs::File::create(slot.path())
            .await
            .map_err(|e| ResolveError::Storage {
                id: id.to_string(),
                reason: format!("cannot create staging file: {}", e),
            })?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ResolveError::UpstreamFetch {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| ResolveError::UpstreamFetch {
                id: id.to_string(),
                reason: format!("staging write failed: {}", e),
            })?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| ResolveError::UpstreamFetch {
        id: id.to_string(),
        reason: format!("staging flush failed: {}", e),
    })?;

    debug!(track_id = id, bytes = written, "Audio staged");
    Ok(())
}
