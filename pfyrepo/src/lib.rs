//! Dépôt de métadonnées des pistes résolues
//!
//! Ce module fournit la persistance des enregistrements de pistes :
//! une ligne par identifiant résolu, créée une seule fois (create-once,
//! read-many), avec l'URL durable du fichier audio stocké.
//!
//! ## Schéma de base de données
//!
//! ```sql
//! CREATE TABLE songs (
//!     id TEXT PRIMARY KEY,           -- Identifiant externe de la piste
//!     title TEXT NOT NULL,
//!     artist TEXT NOT NULL,
//!     duration INTEGER NOT NULL,     -- Durée en secondes
//!     small_thumbnail TEXT NOT NULL,
//!     large_thumbnail TEXT NOT NULL,
//!     url TEXT NOT NULL,             -- URL publique durable
//!     created_at TEXT NOT NULL       -- Date de création (RFC3339)
//! );
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Erreurs du dépôt de métadonnées
#[derive(Error, Debug)]
pub enum RepoError {
    /// Erreur SQLite sous-jacente
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Erreur d'un backend alternatif (dépôt hébergé, double de test...)
    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Type Result personnalisé pour pfyrepo
pub type Result<T> = std::result::Result<T, RepoError>;

/// Enregistrement d'une piste résolue
///
/// Un enregistrement n'existe que lorsque la résolution a produit une URL
/// durable fonctionnelle : il n'y a pas d'état partiel ou provisoire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Identifiant externe unique de la piste
    pub id: String,
    /// Titre de la piste (chaîne vide si inconnu en amont)
    pub title: String,
    /// Artiste (chaîne vide si inconnu en amont)
    pub artist: String,
    /// Durée en secondes (0 si inconnue en amont)
    pub duration: u64,
    /// URL de la vignette basse résolution (chaîne vide si absente)
    pub small_thumbnail: String,
    /// URL de la vignette haute résolution (chaîne vide si absente)
    pub large_thumbnail: String,
    /// URL publique durable du fichier audio stocké
    pub url: String,
}

/// Interface du dépôt de métadonnées
///
/// Les implémentations doivent garantir l'unicité de `id` : une insertion
/// pour un identifiant déjà présent est un no-op bénin, jamais une erreur
/// fatale (dernière ligne de défense en cas d'appels concurrents).
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Récupère l'enregistrement d'une piste, ou None si inconnu
    async fn get(&self, id: &str) -> Result<Option<TrackRecord>>;

    /// Insère un enregistrement ; no-op si l'identifiant existe déjà
    async fn insert(&self, record: &TrackRecord) -> Result<()>;
}

/// Dépôt de métadonnées sur SQLite
///
/// Note : ce type est conçu pour être utilisé derrière un `Arc`.
/// La synchronisation est gérée par le Mutex interne de la connexion.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Initialise le dépôt, en créant la table si nécessaire
    ///
    /// # Arguments
    ///
    /// * `path` - Chemin vers le fichier de base de données SQLite
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use pfyrepo::SqliteRepository;
    /// use std::path::Path;
    ///
    /// let repo = SqliteRepository::init(Path::new("pottify.db")).unwrap();
    /// ```
    pub fn init(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                duration INTEGER NOT NULL,
                small_thumbnail TEXT NOT NULL,
                large_thumbnail TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        debug!(path = %path.display(), "Track database ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Variante en mémoire, utile pour les tests et le mode éphémère
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                duration INTEGER NOT NULL,
                small_thumbnail TEXT NOT NULL,
                large_thumbnail TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Compte le nombre total d'enregistrements
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Supprime un enregistrement
    ///
    /// # Arguments
    ///
    /// * `id` - Identifiant de la piste à supprimer
    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM songs WHERE id = ?1", [id])?;
        Ok(())
    }
}

#[async_trait]
impl TrackRepository for SqliteRepository {
    async fn get(&self, id: &str) -> Result<Option<TrackRecord>> {
        let conn = self.conn.lock().unwrap();

        let record = conn
            .query_row(
                "SELECT id, title, artist, duration, small_thumbnail, large_thumbnail, url
                 FROM songs WHERE id = ?1",
                [id],
                |row| {
                    Ok(TrackRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        artist: row.get(2)?,
                        duration: row.get::<_, i64>(3)? as u64,
                        small_thumbnail: row.get(4)?,
                        large_thumbnail: row.get(5)?,
                        url: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    async fn insert(&self, record: &TrackRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // INSERT OR IGNORE : une insertion concurrente pour le même id
        // laisse l'enregistrement existant intact (no-op bénin)
        conn.execute(
            "INSERT OR IGNORE INTO songs
                (id, title, artist, duration, small_thumbnail, large_thumbnail, url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.title,
                record.artist,
                record.duration as i64,
                record.small_thumbnail,
                record.large_thumbnail,
                record.url,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}
