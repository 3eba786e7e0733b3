use crate::domain::error::GatewayError;
use crate::domain::models::ImageUpload;
use async_trait::async_trait;

/// A hosted language model that answers text prompts and image prompts.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete_text(&self, prompt: &str) -> Result<String, GatewayError>;

    async fn complete_vision(
        &self,
        image: &ImageUpload,
        prompt: &str,
    ) -> Result<String, GatewayError>;
}
