//! # pfyserver - Surface HTTP du service de résolution
//!
//! Cette crate expose l'orchestrateur de résolution sur HTTP :
//!
//! - `GET /song/{id}/url` : résolution d'un identifiant de piste en URL
//!   audio durable (enveloppes JSON `{data, message}` / `{code, message,
//!   details}`)
//! - `GET /api/health` : état du service (uptime, horodatage)
//! - `GET /` : bannière d'identification du service
//!
//! Le module [`server`] fournit l'API de haut niveau pour composer les
//! routers et démarrer le serveur avec arrêt gracieux sur Ctrl+C.

pub mod api;
pub mod server;

pub use api::{create_song_router, service_router, DataEnvelope, ErrorEnvelope, SongUrl};
pub use server::{Server, ServerInfo};
