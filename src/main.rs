//! HTTP server: bootstraps the database and schema, then serves the CRUD API.

use lending_crud::{
    apply_schema, build_router, connect, ensure_database_exists, init_tracing, load_model, resolve,
    AppState, Settings,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect(&settings.database_url, settings.max_connections).await?;

    let config = load_model(settings.model_path.as_deref()).await?;
    let model = resolve(&config)?;
    apply_schema(&pool, &config).await?;

    let app = build_router(AppState::new(pool, model), settings.body_limit_bytes);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
