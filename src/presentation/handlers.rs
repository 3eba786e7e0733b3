use crate::application::auth_service::AuthService;
use crate::application::reading_service::ReadingService;
use crate::domain::error::{DomainError, GatewayError};
use crate::domain::models::{
    ImageReadingKind, LanguageQuery, RashifalRequest, RashifalResponse, SummaryResponse,
    UpstreamErrorPolicy, resolve_language,
};
use crate::presentation::upload::read_upload_form;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const SUCCESS: &str = "success";

pub struct AppState {
    pub readings: ReadingService,
    pub auth_service: AuthService,
    pub upstream_errors: UpstreamErrorPolicy,
    pub max_upload_bytes: usize,
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn detail(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Upstream(msg)
            | ApiError::Storage(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        if status.is_server_error() {
            error!(error = %error_msg, status = %status, "Request failed");
        } else {
            warn!(error = %error_msg, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            detail: self.detail().to_string(),
        })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            // Repository failures surface as bare anyhow errors.
            None => ApiError::Storage(format!("{:#}", err)),
        }
    }
}

/// Applies the configured policy to a failed gateway call.
fn settle_reading(
    policy: UpstreamErrorPolicy,
    outcome: Result<String, GatewayError>,
) -> Result<String, ApiError> {
    match (outcome, policy) {
        (Ok(text), _) => Ok(text),
        (Err(e), UpstreamErrorPolicy::Embed) => {
            warn!(error = %e, "Returning upstream failure inside a success response");
            Ok(e.legacy_message())
        }
        (Err(e), UpstreamErrorPolicy::Propagate) => Err(ApiError::Upstream(e.to_string())),
    }
}

fn summary(text: String) -> HttpResponse {
    HttpResponse::Ok().json(SummaryResponse {
        status: SUCCESS.to_string(),
        summary: text,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn image_reading(
    kind: ImageReadingKind,
    state: web::Data<AppState>,
    query: web::Query<LanguageQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_upload_form(payload, state.max_upload_bytes).await?;
    let language = resolve_language(form.language.as_deref().or(query.language.as_deref()));
    info!(
        kind = %kind,
        language = %language,
        image_bytes = form.image.bytes.len(),
        mime = %form.image.mime_type,
        "Image reading requested"
    );

    let outcome = state
        .readings
        .image_reading(kind, &form.image, language)
        .await;
    let text = settle_reading(state.upstream_errors, outcome)?;
    Ok(summary(text))
}

#[instrument(skip(state, query, payload))]
pub async fn upload_palm(
    state: web::Data<AppState>,
    query: web::Query<LanguageQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    image_reading(ImageReadingKind::Palm, state, query, payload).await
}

#[instrument(skip(state, query, payload))]
pub async fn upload_face(
    state: web::Data<AppState>,
    query: web::Query<LanguageQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    image_reading(ImageReadingKind::Face, state, query, payload).await
}

#[instrument(skip(state, req), fields(dob = %req.dob))]
pub async fn rashifal(
    state: web::Data<AppState>,
    req: web::Json<RashifalRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(
        has_time = req.time.is_some(),
        has_location = req.location.is_some(),
        language = %req.language(),
        "Rashifal requested"
    );

    let outcome = state.readings.rashifal(&req).await;
    let text = settle_reading(state.upstream_errors, outcome)?;
    Ok(HttpResponse::Ok().json(RashifalResponse {
        status: SUCCESS.to_string(),
        rashifal: text,
    }))
}

#[instrument(skip(state, query))]
pub async fn muhurat(
    state: web::Data<AppState>,
    query: web::Query<LanguageQuery>,
) -> Result<HttpResponse, ApiError> {
    let language = query.language();
    info!(language = %language, "Muhurat requested");

    let outcome = state.readings.muhurat(language).await;
    let text = settle_reading(state.upstream_errors, outcome)?;
    Ok(summary(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_reading_embeds_legacy_text() {
        let text = settle_reading(UpstreamErrorPolicy::Embed, Err(GatewayError::RateLimited))
            .unwrap();
        assert_eq!(text, "Error from OpenAI: Rate limited by upstream");
    }

    #[test]
    fn test_settle_reading_propagates_as_bad_gateway() {
        let err = settle_reading(
            UpstreamErrorPolicy::Propagate,
            Err(GatewayError::EmptyResponse),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_settle_reading_passes_answers_through() {
        for policy in [UpstreamErrorPolicy::Embed, UpstreamErrorPolicy::Propagate] {
            let text = settle_reading(policy, Ok("Shubh".to_string())).unwrap();
            assert_eq!(text, "Shubh");
        }
    }

    #[test]
    fn test_anyhow_without_domain_error_is_storage() {
        let err = ApiError::from(anyhow::anyhow!("disk full"));
        assert!(matches!(err, ApiError::Storage(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        let validation = ApiError::from(anyhow::Error::from(DomainError::Validation(
            "bad".to_string(),
        )));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let unauthorized = ApiError::from(anyhow::Error::from(DomainError::Unauthorized(
            "no".to_string(),
        )));
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }
}
