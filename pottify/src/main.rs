use anyhow::Context;
use pfyconfig::get_config;
use pfyrepo::SqliteRepository;
use pfyresolver::{Resolver, StagingArea};
use pfyserver::{create_song_router, service_router, Server};
use pfysource::HttpSource;
use pfystore::BucketStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Infrastructure ==========

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🎵 Starting Pottify track resolution service...");
    let config = get_config();

    // Stockage d'objets durable
    info!("📦 Connecting to object storage...");
    let store = BucketStore::new(
        config.get_storage_url().context("storage URL missing")?,
        config.get_bucket_name(),
        config.get_storage_key().context("storage key missing")?,
    )?;
    if let Err(e) = store.ensure_bucket().await {
        tracing::warn!("⚠️ Could not verify storage bucket: {}", e);
    }

    // Dépôt de métadonnées
    let db_path = config.get_database_path();
    info!("🗄️ Opening track database at {}", db_path.display());
    let repo = SqliteRepository::init(&db_path)
        .with_context(|| format!("cannot open database at {}", db_path.display()))?;

    // ========== PHASE 2 : Pipeline de résolution ==========

    let source = HttpSource::new(config.get_source_api_url().context("source API URL missing")?)?;

    let staging_dir = config.get_staging_dir();
    let staging = StagingArea::new(&staging_dir)
        .with_context(|| format!("cannot create staging directory {}", staging_dir.display()))?;

    let resolver = Arc::new(Resolver::new(
        Arc::new(source),
        Arc::new(store),
        Arc::new(repo),
        staging,
    ));

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("🌐 Starting HTTP server...");
    let mut server = Server::new_configured();
    server.add_router("/", service_router(server.info())).await;
    server.add_router("/", create_song_router(resolver)).await;

    server.start().await;

    info!("✅ Pottify is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
