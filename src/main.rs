use actix_web::{App, HttpServer, web};
use rashifal_api::application::auth_service::AuthService;
use rashifal_api::application::reading_service::ReadingService;
use rashifal_api::data::json_store::JsonFileUserRepository;
use rashifal_api::infrastructure::config::AppConfig;
use rashifal_api::infrastructure::logging::init_logging;
use rashifal_api::infrastructure::openai::OpenAiGateway;
use rashifal_api::infrastructure::security::generate_secret;
use rashifal_api::presentation::handlers::AppState;
use rashifal_api::presentation::middleware::RequestTracing;
use rashifal_api::presentation::routes::{ROUTES, configure_routes, open_cors};
use std::io;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[tokio::main]
#[instrument]
async fn main() -> io::Result<()> {
    // .env may carry RUST_LOG, so load it before logging
    dotenv::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    info!(?config, "Configuration loaded");

    if config.openai.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every reading will report an upstream error");
    }

    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        warn!("JWT_SECRET is not set; generated a per-process secret");
        generate_secret()
    });

    let user_repository = JsonFileUserRepository::new(config.users_file.clone());
    info!(path = %user_repository.path().display(), "User store ready");

    let gateway = OpenAiGateway::new(config.openai.clone());

    let state = web::Data::new(AppState {
        readings: ReadingService::new(Arc::new(gateway)),
        auth_service: AuthService::new(Arc::new(user_repository), jwt_secret),
        upstream_errors: config.upstream_errors,
        max_upload_bytes: config.max_upload_bytes,
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(RequestTracing)
            .wrap(open_cors())
            .configure(configure_routes)
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let server = server.bind((config.host.as_str(), config.port))?;
    info!(address = %bind_addr, routes = %ROUTES, "Starting HTTP server");
    server.run().await
}
