//! # pfystore - Stockage d'objets durable pour l'audio résolu
//!
//! Cette crate pousse un fichier local vers un backend de stockage
//! d'objets (API REST type Supabase Storage) sous une clé déterministe,
//! et retourne l'URL publique de l'objet.
//!
//! ## Sémantique upsert
//!
//! Un upload sur une clé déjà occupée remplace l'objet existant
//! (`x-upsert: true`) : le pipeline de résolution peut donc être rejoué
//! sans danger après un échec partiel.
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pfystore::{BlobStore, BucketStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pfystore::StoreError> {
//!     let store = BucketStore::new(
//!         "http://localhost:54321",
//!         "music-files",
//!         "service-key",
//!     )?;
//!
//!     store.ensure_bucket().await?;
//!     let url = store.upload(Path::new("/tmp/abc123.mp3"), "abc123.mp3").await?;
//!     println!("Public URL: {}", url);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Type Result personnalisé pour pfystore
pub type Result<T> = std::result::Result<T, StoreError>;

/// Erreurs possibles lors de l'accès au stockage d'objets
#[derive(Error, Debug)]
pub enum StoreError {
    /// Le backend a répondu avec un statut d'erreur
    /// (bucket manquant, clé de service invalide, etc.)
    #[error("Storage backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Backend injoignable (réseau, timeout, DNS)
    #[error("Storage HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de lecture du fichier local à uploader
    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stockage d'objets adressé par clé
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Pousse un fichier local sous la clé donnée (sémantique upsert)
    ///
    /// Retourne l'URL publique de l'objet, résolvable sans
    /// authentification.
    async fn upload(&self, local: &Path, key: &str) -> Result<String>;

    /// URL publique d'un objet pour une clé donnée
    fn public_url(&self, key: &str) -> String;
}

/// Timeout global d'un upload complet
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Description d'un bucket renvoyée par l'API de stockage
#[derive(Debug, Deserialize)]
struct BucketInfo {
    name: String,
}

/// Client du stockage d'objets REST (type Supabase Storage)
///
/// Routes utilisées :
/// - `POST {base}/storage/v1/object/{bucket}/{key}` : upload (upsert)
/// - `GET  {base}/storage/v1/object/public/{bucket}/{key}` : lecture publique
/// - `GET/POST {base}/storage/v1/bucket` : liste/création des buckets
pub struct BucketStore {
    base_url: String,
    bucket: String,
    service_key: String,
    client: reqwest::Client,
}

impl BucketStore {
    /// Crée un client de stockage pour le bucket donné
    ///
    /// # Arguments
    ///
    /// * `base_url` - URL de base du backend de stockage
    /// * `bucket` - Nom du bucket cible
    /// * `service_key` - Clé de service pour authentifier les écritures
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key: service_key.into(),
            client,
        })
    }

    /// URL d'écriture d'un objet
    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    /// Vérifie que le bucket cible existe, et le crée (public) sinon
    ///
    /// Appelé au démarrage ; un échec ici n'empêche pas le serveur de
    /// tourner, l'appelant décide de la sévérité.
    pub async fn ensure_bucket(&self) -> Result<()> {
        let list_url = format!("{}/storage/v1/bucket", self.base_url);
        let response = self
            .client
            .get(&list_url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let buckets: Vec<BucketInfo> = response.json().await?;
        if buckets.iter().any(|b| b.name == self.bucket) {
            debug!(bucket = %self.bucket, "Bucket already exists");
            return Ok(());
        }

        let create_url = format!("{}/storage/v1/bucket", self.base_url);
        let response = self
            .client
            .post(&create_url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "name": self.bucket, "public": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        info!(bucket = %self.bucket, "Bucket created");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for BucketStore {
    async fn upload(&self, local: &Path, key: &str) -> Result<String> {
        let file = tokio::fs::File::open(local).await?;
        let length = file.metadata().await?.len();

        debug!(key = key, size = length, "Uploading staged file");

        // Le corps est streamé depuis le disque, jamais chargé entier
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header("content-type", "audio/mpeg")
            .header("content-length", length)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let url = self.public_url(key);
        info!(key = key, url = %url, "Upload complete");
        Ok(url)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}
