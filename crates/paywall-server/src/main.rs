use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paywall_server::{
    config::ServerConfig, db::Database, metrics::register_metrics, state::AppState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;
    let max_upload_bytes = config.max_upload_bytes;

    tracing::info!("Starting paywall-server on port {}", port);
    tracing::info!("Lightning network: {:?}", config.network);
    tracing::info!("Assets directory: {}", config.assets_dir.display());
    if config.insecure_dev {
        tracing::warn!("Insecure dev mode: callbacks are not SSRF-checked");
    }

    let db = Database::new(&config.db_path).expect("Failed to initialize database");
    tracing::info!("Database initialized at: {}", config.db_path);

    register_metrics();

    let state = AppState::new(config, db).expect("Failed to initialize application state");
    let minter = state
        .http_minter()
        .expect("Failed to initialize invoice minter");
    let state_data = web::Data::new(state);
    let minter_data = web::Data::new(minter);

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    HttpServer::new(move || {
        let cors = paywall_server::cors::build_cors(&allowed_origins);

        App::new()
            .app_data(state_data.clone())
            .app_data(minter_data.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(paywall_server::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
