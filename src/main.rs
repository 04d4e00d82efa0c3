use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use campusvoice::{
    annotator::{Annotator, HeuristicAnnotator, HttpAnnotator},
    auth::jwt::JwtService,
    config::AppConfig,
    db,
    routes::create_router,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        annotator_enabled = config.annotator_endpoint.is_some(),
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let jwt = JwtService::from_config(&config)?;

    let annotator: Arc<dyn Annotator> = match (&config.annotator_endpoint, &config.annotator_api_key)
    {
        (Some(endpoint), Some(api_key)) => Arc::new(HttpAnnotator::new(
            endpoint.clone(),
            api_key.clone(),
            config.annotator_model.clone(),
        )),
        _ => {
            tracing::info!("no annotator endpoint configured, using keyword heuristic");
            Arc::new(HeuristicAnnotator)
        }
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, annotator, jwt);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
