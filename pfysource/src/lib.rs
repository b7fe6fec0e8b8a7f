//! # pfysource - Accès aux sources de contenu audio
//!
//! Cette crate adapte une source de contenu externe, adressée par
//! identifiant de piste, en un flux d'octets et des métadonnées
//! normalisées.
//!
//! ## Vue d'ensemble
//!
//! - [`ContentSource`] : trait d'accès (métadonnées + flux audio)
//! - [`TrackInfo`] : métadonnées normalisées avec règles de défaut
//!   explicites (chaîne vide, durée nulle)
//! - [`HttpSource`] : implémentation REST (API catalogue + CDN)
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pfysource::{ContentSource, HttpSource};
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pfysource::SourceError> {
//!     let source = HttpSource::new("http://localhost:9000/api")?;
//!
//!     let info = source.track_info("dQw4w9WgXcQ").await?;
//!     println!("{} - {} ({}s)", info.artist, info.title, info.duration);
//!
//!     let mut stream = source.fetch(&info).await?;
//!     while let Some(chunk) = stream.next().await {
//!         let chunk = chunk?;
//!         // écrire le chunk vers la zone de staging...
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod source;

pub use error::{Result, SourceError};
pub use models::{RawTrack, TrackInfo};
pub use source::{AudioStream, ContentSource, HttpSource};
