use crate::presentation::auth::{login, register};
use crate::presentation::handlers::{health_check, muhurat, rashifal, upload_face, upload_palm};
use actix_cors::Cors;
use actix_web::web;

pub const ROUTES: &str = "GET /health, POST /upload/palm, POST /upload/face, POST /rashifal, \
                          GET /muhurat, POST /register, POST /login (also under /v1)";

/// Mounts the API at the root, where existing mobile clients call it, and
/// again under `/v1`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/v1").configure(api_routes))
        .configure(api_routes);
}

fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/upload/palm", web::post().to(upload_palm))
        .route("/upload/face", web::post().to(upload_face))
        .route("/rashifal", web::post().to(rashifal))
        .route("/muhurat", web::get().to(muhurat))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login));
}

/// Any origin, method and header, with credentials.
pub fn open_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
