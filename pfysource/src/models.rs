//! Modèles de données de l'API catalogue
//!
//! L'API amont renvoie des champs optionnels et parfois mal typés :
//! `RawTrack` reflète fidèlement cette réponse, `TrackInfo` en est la
//! forme normalisée avec les règles de défaut explicites (chaîne vide,
//! durée nulle) appliquées en un seul endroit.

use crate::error::{Result, SourceError};
use serde::Deserialize;
use serde_json::Value;

/// Réponse brute de l'API catalogue pour une piste
///
/// Tous les champs de métadonnées sont optionnels : l'amont peut en
/// omettre n'importe lequel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrack {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Durée en secondes ; peut arriver en nombre, en chaîne, ou absente
    pub duration: Option<Value>,
    pub poster: Option<String>,
    pub poster_large: Option<String>,
    /// URL du flux audio de la piste
    pub audio_url: Option<String>,
}

/// Métadonnées normalisées d'une piste, prêtes pour la résolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Identifiant externe de la piste
    pub id: String,
    /// Titre (chaîne vide si absent en amont)
    pub title: String,
    /// Artiste (chaîne vide si absent en amont)
    pub artist: String,
    /// Durée en secondes (0 si absente ou non numérique)
    pub duration: u64,
    /// Vignette basse résolution (chaîne vide si absente)
    pub small_thumbnail: String,
    /// Vignette haute résolution (chaîne vide si absente)
    pub large_thumbnail: String,
    /// URL du flux audio amont
    pub audio_url: String,
}

impl TrackInfo {
    /// Normalise une réponse brute de l'API catalogue
    ///
    /// Règles de défaut : chaîne vide pour les champs texte absents,
    /// 0 pour une durée absente ou non numérique. L'absence d'URL audio
    /// est en revanche une erreur : sans flux, rien à résoudre.
    pub fn from_raw(id: &str, raw: RawTrack) -> Result<Self> {
        let audio_url = raw
            .audio_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SourceError::Upstream(format!("no audio url for track {}", id)))?;

        Ok(Self {
            id: id.to_string(),
            title: raw.title.unwrap_or_default(),
            artist: raw.artist.unwrap_or_default(),
            duration: duration_seconds(raw.duration),
            small_thumbnail: raw.poster.unwrap_or_default(),
            large_thumbnail: raw.poster_large.unwrap_or_default(),
            audio_url,
        })
    }
}

/// Extrait une durée en secondes d'une valeur JSON hétérogène
fn duration_seconds(value: Option<Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from_json(value: serde_json::Value) -> RawTrack {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_metadata() {
        let raw = raw_from_json(json!({
            "title": "Comfortably Numb",
            "artist": "Pink Floyd",
            "duration": 382,
            "poster": "http://img.example.com/s.jpg",
            "posterLarge": "http://img.example.com/l.jpg",
            "audioUrl": "http://cdn.example.com/track.mp3"
        }));

        let info = TrackInfo::from_raw("abc123", raw).unwrap();
        assert_eq!(info.title, "Comfortably Numb");
        assert_eq!(info.artist, "Pink Floyd");
        assert_eq!(info.duration, 382);
        assert_eq!(info.small_thumbnail, "http://img.example.com/s.jpg");
        assert_eq!(info.large_thumbnail, "http://img.example.com/l.jpg");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let raw = raw_from_json(json!({
            "audioUrl": "http://cdn.example.com/track.mp3"
        }));

        let info = TrackInfo::from_raw("abc123", raw).unwrap();
        assert_eq!(info.title, "");
        assert_eq!(info.artist, "");
        assert_eq!(info.duration, 0);
        assert_eq!(info.small_thumbnail, "");
        assert_eq!(info.large_thumbnail, "");
    }

    #[test]
    fn test_non_numeric_duration_defaults_to_zero() {
        let raw = raw_from_json(json!({
            "duration": "live",
            "audioUrl": "http://cdn.example.com/track.mp3"
        }));
        assert_eq!(TrackInfo::from_raw("abc123", raw).unwrap().duration, 0);

        let raw = raw_from_json(json!({
            "duration": {"minutes": 3},
            "audioUrl": "http://cdn.example.com/track.mp3"
        }));
        assert_eq!(TrackInfo::from_raw("abc123", raw).unwrap().duration, 0);
    }

    #[test]
    fn test_numeric_string_duration() {
        let raw = raw_from_json(json!({
            "duration": "245",
            "audioUrl": "http://cdn.example.com/track.mp3"
        }));
        assert_eq!(TrackInfo::from_raw("abc123", raw).unwrap().duration, 245);
    }

    #[test]
    fn test_missing_audio_url_is_an_error() {
        let raw = raw_from_json(json!({ "title": "No Stream" }));
        let err = TrackInfo::from_raw("abc123", raw).unwrap_err();
        assert!(matches!(err, SourceError::Upstream(_)));
    }
}
