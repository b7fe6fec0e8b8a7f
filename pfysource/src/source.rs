//! Accès au contenu audio d'une source externe
//!
//! Le trait [`ContentSource`] sépare la résolution des métadonnées
//! (`track_info`) de l'obtention du flux d'octets (`fetch`). Le flux est
//! consommé chunk par chunk par l'appelant : aucun chargement complet en
//! mémoire, la contre-pression est celle du transport HTTP.

use crate::error::{Result, SourceError};
use crate::models::{RawTrack, TrackInfo};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Flux d'octets audio produit par une source
///
/// Une erreur émise en cours de flux signifie un transfert partiel :
/// l'appelant ne doit jamais le traiter comme un succès.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Source de contenu audio adressée par identifiant de piste
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Récupère les métadonnées d'une piste, dont l'URL de son flux audio
    async fn track_info(&self, id: &str) -> Result<TrackInfo>;

    /// Ouvre le flux audio d'une piste
    ///
    /// Seule une fin de flux propre vaut succès ; toute erreur de chunk
    /// doit interrompre le pipeline de l'appelant.
    async fn fetch(&self, info: &TrackInfo) -> Result<AudioStream>;
}

/// Timeout global des requêtes de métadonnées
const API_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout global du transfert audio complet
const STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Source de contenu adossée à une API catalogue REST
///
/// - `GET {base}/tracks/{id}` renvoie les métadonnées JSON de la piste
///   (dont `audioUrl`)
/// - `GET {audioUrl}` renvoie le flux audio
pub struct HttpSource {
    base_url: String,
    api_client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpSource {
    /// Crée une source HTTP pour l'API catalogue donnée
    ///
    /// # Arguments
    ///
    /// * `base_url` - URL de base de l'API (ex: "http://localhost:9000/api")
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let api_client = reqwest::Client::builder().timeout(API_TIMEOUT).build()?;
        let stream_client = reqwest::Client::builder().timeout(STREAM_TIMEOUT).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_client,
            stream_client,
        })
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn track_info(&self, id: &str) -> Result<TrackInfo> {
        let url = format!("{}/tracks/{}", self.base_url, id);
        debug!(track_id = id, url = %url, "Fetching track metadata");

        let response = self.api_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status_code(
                status.as_u16(),
                format!("track {}", id),
            ));
        }

        let raw: RawTrack = response.json().await?;
        TrackInfo::from_raw(id, raw)
    }

    async fn fetch(&self, info: &TrackInfo) -> Result<AudioStream> {
        debug!(track_id = %info.id, audio_url = %info.audio_url, "Opening audio stream");

        let response = self.stream_client.get(&info.audio_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status_code(
                status.as_u16(),
                format!("audio stream for track {}", info.id),
            ));
        }

        let track_id = info.id.clone();
        let stream = response
            .bytes_stream()
            .map_err(move |e| SourceError::Upstream(format!("stream error for {}: {}", track_id, e)));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_track_info_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tracks/abc123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"title":"Echoes","artist":"Pink Floyd","duration":1412,
                   "poster":"http://img/s.jpg","posterLarge":"http://img/l.jpg",
                   "audioUrl":"http://cdn/echoes.mp3"}"#,
            )
            .create_async()
            .await;

        let source = HttpSource::new(server.url()).unwrap();
        let info = source.track_info("abc123").await.unwrap();

        assert_eq!(info.id, "abc123");
        assert_eq!(info.title, "Echoes");
        assert_eq!(info.duration, 1412);
        assert_eq!(info.audio_url, "http://cdn/echoes.mp3");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_track_info_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tracks/missing1")
            .with_status(404)
            .create_async()
            .await;

        let source = HttpSource::new(server.url()).unwrap();
        let err = source.track_info("missing1").await.unwrap_err();

        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_track_info_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tracks/abc123")
            .with_status(502)
            .create_async()
            .await;

        let source = HttpSource::new(server.url()).unwrap();
        let err = source.track_info("abc123").await.unwrap_err();

        assert!(matches!(err, SourceError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fetch_streams_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio/abc123.mp3")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"mp3-payload-bytes")
            .create_async()
            .await;

        let source = HttpSource::new(server.url()).unwrap();
        let info = TrackInfo {
            id: "abc123".to_string(),
            title: String::new(),
            artist: String::new(),
            duration: 0,
            small_thumbnail: String::new(),
            large_thumbnail: String::new(),
            audio_url: format!("{}/audio/abc123.mp3", server.url()),
        };

        let mut stream = source.fetch(&info).await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(collected, b"mp3-payload-bytes");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio/abc123.mp3")
            .with_status(503)
            .create_async()
            .await;

        let source = HttpSource::new(server.url()).unwrap();
        let info = TrackInfo {
            id: "abc123".to_string(),
            title: String::new(),
            artist: String::new(),
            duration: 0,
            small_thumbnail: String::new(),
            large_thumbnail: String::new(),
            audio_url: format!("{}/audio/abc123.mp3", server.url()),
        };

        let err = match source.fetch(&info).await {
            Ok(_) => panic!("expected fetch to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, SourceError::Upstream(_)));
    }
}
