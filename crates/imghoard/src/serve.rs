//! Server startup and shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use cas::{CasConfig, FileStore, MemoryStore, ObjectStore};
use hoardconf::{HoardConfig, StoreBackend};
use tracing::{info, warn};

use crate::web::{self, ImagePolicy, WebState};

/// Open the object store the config asks for.
pub fn open_store(config: &HoardConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.store.backend {
        StoreBackend::File => {
            let cas_config = CasConfig {
                base_path: config.paths.store_dir.clone(),
                read_only: config.store.read_only,
            };
            let store = FileStore::new(cas_config).with_context(|| {
                format!(
                    "failed to open object store at {}",
                    config.paths.store_dir.display()
                )
            })?;
            info!("📦 Object store at {}", config.paths.store_dir.display());
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("📦 Using in-memory object store; images are lost on restart");
            if config.store.read_only {
                Arc::new(MemoryStore::read_only())
            } else {
                Arc::new(MemoryStore::new())
            }
        }
    };

    if config.store.read_only {
        warn!("   Store is read-only; uploads will fail");
    }

    Ok(store)
}

/// Run the HTTP server until SIGINT/SIGTERM.
pub async fn run(config: HoardConfig) -> Result<()> {
    let store = open_store(&config)?;
    let policy = ImagePolicy::from_config(&config.images)?;
    info!("   Max image size: {} bytes", policy.max_image_size);

    let app = web::router(WebState::new(store, policy));

    let addr = config.bind.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🖼️  imghoard listening on http://{}", addr);
    info!("   Upload: PUT http://{}/images", addr);
    info!("   Fetch:  GET http://{}/images/:id", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas::Fingerprint;
    use tempfile::TempDir;

    #[test]
    fn test_open_file_store() {
        let dir = TempDir::new().unwrap();
        let mut config = HoardConfig::default();
        config.paths.store_dir = dir.path().join("store");

        let store = open_store(&config).unwrap();
        let key = Fingerprint::from_data(b"x");
        assert!(store.put(&key, b"x", Some("image/png")).unwrap().is_some());
        assert!(dir.path().join("store/objects").exists());
    }

    #[test]
    fn test_open_read_only_memory_store() {
        let mut config = HoardConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.store.read_only = true;

        let store = open_store(&config).unwrap();
        let key = Fingerprint::from_data(b"x");
        assert!(store.put(&key, b"x", Some("image/png")).unwrap().is_none());
    }
}
