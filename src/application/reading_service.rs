use crate::application::prompts::{image_reading_prompt, muhurat_prompt, rashifal_prompt};
use crate::domain::error::GatewayError;
use crate::domain::gateway::ModelGateway;
use crate::domain::models::{ImageReadingKind, ImageUpload, RashifalRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Turns request data into a prompt and asks the model gateway for a reading.
pub struct ReadingService {
    gateway: Arc<dyn ModelGateway>,
}

impl ReadingService {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self, image), fields(kind = %kind, image_bytes = image.bytes.len()))]
    pub async fn image_reading(
        &self,
        kind: ImageReadingKind,
        image: &ImageUpload,
        language: &str,
    ) -> Result<String, GatewayError> {
        let prompt = image_reading_prompt(kind, language);
        debug!(prompt_len = prompt.len(), "Requesting image reading");

        let result = self.gateway.complete_vision(image, &prompt).await;
        log_outcome("image", &result);
        result
    }

    #[instrument(skip(self, req), fields(language = %req.language()))]
    pub async fn rashifal(&self, req: &RashifalRequest) -> Result<String, GatewayError> {
        let prompt = rashifal_prompt(
            &req.dob,
            req.time.as_deref(),
            req.location.as_deref(),
            req.language(),
        );
        debug!(prompt_len = prompt.len(), "Requesting rashifal");

        let result = self.gateway.complete_text(&prompt).await;
        log_outcome("rashifal", &result);
        result
    }

    #[instrument(skip(self))]
    pub async fn muhurat(&self, language: &str) -> Result<String, GatewayError> {
        let prompt = muhurat_prompt(language);
        debug!(prompt_len = prompt.len(), "Requesting muhurat");

        let result = self.gateway.complete_text(&prompt).await;
        log_outcome("muhurat", &result);
        result
    }
}

fn log_outcome(reading: &str, result: &Result<String, GatewayError>) {
    match result {
        Ok(text) => info!(reading, answer_len = text.len(), "Reading generated"),
        Err(e) => warn!(reading, error = %e, "Model gateway failed"),
    }
}
