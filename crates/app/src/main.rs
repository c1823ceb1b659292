use std::sync::Arc;

use auth::{JwtMaker, Maker, PasetoMaker, TokenError};
use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::{Database, TokenKind};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bank={level},server={level},engine={level},auth={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };
    tracing::info!("Found server settings...");

    let token_maker = token_maker(server.token.kind, &server.token.symmetric_key)?;
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{bind}:{}", server.port)).await?;

    let state = server::ServerState {
        engine: Arc::new(engine),
        token_maker,
        access_token_duration: chrono::Duration::seconds(server.token.access_token_duration_secs),
    };
    server::run_with_listener(state, listener).await?;

    Ok(())
}

fn token_maker(kind: TokenKind, symmetric_key: &str) -> Result<Arc<dyn Maker>, TokenError> {
    Ok(match kind {
        TokenKind::Paseto => Arc::new(PasetoMaker::new(symmetric_key)?),
        TokenKind::Jwt => Arc::new(JwtMaker::new(symmetric_key)?),
    })
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match config {
        Database::Memory => ConnectOptions::new("sqlite::memory:"),
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{path}?mode=rwc")),
        Database::Url(url) => ConnectOptions::new(url.clone()),
    };
    if *config == Database::Memory {
        // Every pooled connection would otherwise open its own empty database.
        options.max_connections(1).min_connections(1);
    }

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
