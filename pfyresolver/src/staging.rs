//! Zone de staging des contenus en cours de résolution
//!
//! Un fichier stagé appartient exclusivement à la résolution qui l'a
//! créé et ne doit jamais lui survivre : la libération passe par `Drop`,
//! donc par tous les chemins de sortie (succès, échec de fetch, échec
//! d'upload). La suppression est best-effort : un échec est loggé,
//! jamais propagé.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Répertoire des fichiers transitoires en cours de résolution
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Crée la zone de staging, en créant le répertoire si nécessaire
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Réserve un slot nommé d'après l'identifiant de piste
    ///
    /// Le fichier pointé n'existe pas encore ; il est créé par le
    /// pipeline et supprimé quand le slot est relâché.
    pub fn slot(&self, id: &str) -> StagingSlot {
        StagingSlot {
            path: self.dir.join(format!("{}.mp3.part", id)),
        }
    }

    /// Répertoire de la zone de staging
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Slot de staging possédé par une résolution en cours
///
/// Le fichier sous-jacent est supprimé au `drop`, quel que soit le
/// chemin de sortie de la résolution.
#[derive(Debug)]
pub struct StagingSlot {
    path: PathBuf,
}

impl StagingSlot {
    /// Chemin du fichier stagé
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingSlot {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            // Jamais créé (échec avant la première écriture) : rien à faire
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
            }
        }
    }
}
