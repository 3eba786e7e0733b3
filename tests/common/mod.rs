#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use rashifal_api::application::auth_service::AuthService;
use rashifal_api::application::reading_service::ReadingService;
use rashifal_api::data::user_repository::InMemoryUserRepository;
use rashifal_api::domain::error::GatewayError;
use rashifal_api::domain::gateway::ModelGateway;
use rashifal_api::domain::models::{ImageUpload, UpstreamErrorPolicy};
use rashifal_api::domain::repository::UserRepository;
use rashifal_api::presentation::handlers::AppState;
use std::sync::{Arc, Mutex};

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-integration-tests";
pub const BOUNDARY: &str = "----rashifal-test-boundary";

/// Deterministic gateway that records every prompt it receives.
pub struct StubGateway {
    reply: Result<String, GatewayError>,
    pub prompts: Mutex<Vec<String>>,
    pub images: Mutex<Vec<ImageUpload>>,
}

impl StubGateway {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            prompts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("gateway was never called")
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    async fn complete_text(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }

    async fn complete_vision(
        &self,
        image: &ImageUpload,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.images.lock().unwrap().push(image.clone());
        self.reply.clone()
    }
}

pub fn app_state(
    gateway: Arc<StubGateway>,
    users: Arc<dyn UserRepository>,
    policy: UpstreamErrorPolicy,
    max_upload_bytes: usize,
) -> web::Data<AppState> {
    web::Data::new(AppState {
        readings: ReadingService::new(gateway),
        auth_service: AuthService::new(users, TEST_JWT_SECRET.to_string()),
        upstream_errors: policy,
        max_upload_bytes,
    })
}

pub fn default_state(gateway: Arc<StubGateway>) -> web::Data<AppState> {
    app_state(
        gateway,
        Arc::new(InMemoryUserRepository::new()),
        UpstreamErrorPolicy::Embed,
        1024 * 1024,
    )
}

/// A `multipart/form-data` body with one part per entry:
/// `(name, filename, content type, bytes)`.
pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn image_upload_body(bytes: &[u8]) -> Vec<u8> {
    multipart_body(&[("file", Some("photo.jpg"), Some("image/jpeg"), bytes)])
}
