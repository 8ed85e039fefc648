//! Application bootstrap: telemetry, collaborators, state and routes.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tubely_core::Config;
use tubely_db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository};
use tubely_processing::{FfmpegRemuxer, FfprobeProber, UploadConfig, VideoUploadOrchestrator};
use tubely_storage::create_storage;

use crate::auth::JwtAuthenticator;
use crate::services::ThumbnailService;
use crate::state::AppState;
use crate::telemetry::init_telemetry;

/// Validate `config`, wire every collaborator and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    init_telemetry(config.is_production());
    config.validate()?;

    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Initializing Tubely API"
    );

    let videos: Arc<dyn VideoRepository> = match &config.database_url {
        Some(url) => {
            let pool = database::setup_database(
                url,
                config.db_max_connections,
                config.db_timeout_seconds,
            )
            .await?;
            Arc::new(PgVideoRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, video records are kept in memory");
            Arc::new(InMemoryVideoRepository::new())
        }
    };

    let storage = create_storage(&config).context("Failed to initialize storage")?;

    tokio::fs::create_dir_all(&config.assets_root)
        .await
        .with_context(|| format!("Failed to create {}", config.assets_root.display()))?;
    tokio::fs::create_dir_all(&config.upload_temp_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_temp_dir.display()))?;

    let uploads = Arc::new(VideoUploadOrchestrator::new(
        videos.clone(),
        storage.clone(),
        Arc::new(FfmpegRemuxer::new(config.ffmpeg_path.clone())),
        Arc::new(FfprobeProber::new(config.ffprobe_path.clone())),
        UploadConfig {
            bucket: config.bucket().to_string(),
            temp_dir: config.upload_temp_dir.clone(),
            presign_expiry: config.presign_expiry,
        },
    ));

    let state = Arc::new(AppState {
        thumbnails: Arc::new(ThumbnailService::new(
            config.assets_root.clone(),
            config.public_base_url.clone(),
        )),
        authenticator: Arc::new(JwtAuthenticator::new(&config.jwt_secret)),
        config: config.clone(),
        videos,
        storage,
        uploads,
    });

    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}
