use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use hrms_api::config::AppConfig;
use hrms_infra::{InMemoryRowStore, PostgresRowStore, RowStore, SeedData};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;
    hrms_observability::init(config.log_format);

    if config.jwt_secret_is_default {
        warn!("JWT_SECRET not set; using insecure dev default");
    }

    let store: Arc<dyn RowStore> = match &config.database_url {
        Some(url) => {
            let pg = PostgresRowStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            pg.migrate().await.context("failed to apply schema")?;
            info!("using postgres row store");
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory row store");
            Arc::new(InMemoryRowStore::new())
        }
    };

    if let Some(path) = &config.seed_file {
        SeedData::from_path(path)?
            .apply(store.as_ref())
            .await
            .context("failed to apply seed data")?;
    }

    let app = hrms_api::app::build_app(config.jwt_secret.clone(), store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
