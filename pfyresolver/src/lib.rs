//! # pfyresolver - Résolution cache-aside des pistes audio
//!
//! Cette crate coordonne la résolution d'un identifiant de piste opaque
//! en URL audio durable et publique, en mettant le résultat en cache
//! pour que les requêtes suivantes ne re-téléchargent ni ne re-uploadent
//! jamais le contenu.
//!
//! ## Architecture
//!
//! ```text
//! appelant → Resolver
//!              ├── TrackRepository (lookup)  — hit : URL stockée
//!              └── miss :
//!                    ContentSource → StagingArea → BlobStore
//!                                                      │
//!                    TrackRepository (insert) ←────────┘
//! ```
//!
//! ## Garanties
//!
//! - validation de l'identifiant avant toute E/S
//! - étapes strictement séquentielles au sein d'une résolution
//! - coalescence single-flight des appels concurrents pour un même id
//! - fichier stagé supprimé sur chaque chemin de sortie
//! - pipeline mené à terme même si l'appelant raccroche
//!
//! ## Dépendances principales
//!
//! - `pfysource` : fetch du contenu et des métadonnées amont
//! - `pfystore` : upload durable (upsert par clé)
//! - `pfyrepo` : persistance des enregistrements de pistes
//! - `tokio` : runtime asynchrone

pub mod error;
pub mod resolver;
pub mod staging;

pub use error::{ResolveError, Result};
pub use resolver::{valid_track_id, Resolver};
pub use staging::{StagingArea, StagingSlot};
