use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod interpolate;
mod models;
mod pattern;
mod routes;
mod services;

use config::RunMode;
use models::domain::ModelRegistry;
use services::AppState;
use services::store::{self, MetadataStore};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        "Starting painless-seo for languages [{}] (default `{}`)",
        cfg.seo.languages.join(", "),
        cfg.seo.default_lang
    );

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    let db_path = sqlite_db_path(db_url);
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // SQLite will not create the database file on its own
    if db_path != ":memory:" && !Path::new(db_path).exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(db_path)?;
        tracing::info!("Created database file {}", db_path);
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    // Schema statements are idempotent, so this runs on every start.
    store::run_migrations(&db).await?;
    if mode == RunMode::Migrate {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Model registration ---
    // The registry starts empty here; an embedding host registers its
    // `SeoModel` adapters before building the state. Lifecycle events then
    // arrive either through direct SyncEngine calls or the /hooks endpoints.
    let registry = Arc::new(ModelRegistry::new());

    // --- Initialize core services ---
    let seo_cfg = Arc::new(cfg.seo.clone());
    let state = AppState::new(MetadataStore::new(db), seo_cfg, registry);

    // --- Handle one-shot CLI modes ---
    match mode {
        RunMode::SyncAll => {
            let report = state.sync.sync_all(true, cfg.seo.remove_stale).await?;
            tracing::info!(
                "Sync complete: {} created, {} updated, {} removed.",
                report.created,
                report.updated,
                report.removed
            );
            return Ok(());
        }
        RunMode::ResetAll => {
            let reset = state.sync.reset_all().await?;
            tracing::info!("Reset complete: {} records recomputed.", reset);
            return Ok(());
        }
        RunMode::Migrate | RunMode::Serve => {}
    }

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// The local file path behind a SQLite URL. `sqlite::memory:` must strip to
/// `:memory:` so the pre-creation step below does not make a junk file.
fn sqlite_db_path(url: &str) -> &str {
    url.trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_strip_to_local_paths() {
        assert_eq!(sqlite_db_path("sqlite://./data/seo.db"), "./data/seo.db");
        assert_eq!(sqlite_db_path("sqlite::memory:"), ":memory:");
        assert_eq!(sqlite_db_path("sqlite://file:seo.db"), "seo.db");
        assert_eq!(sqlite_db_path("./data/seo.db"), "./data/seo.db");
    }
}
