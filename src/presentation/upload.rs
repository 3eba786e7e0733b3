use crate::domain::models::ImageUpload;
use crate::presentation::handlers::ApiError;
use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use tracing::{debug, warn};

const FILE_FIELD: &str = "file";
const LANGUAGE_FIELD: &str = "language";
const MAX_TEXT_FIELD_BYTES: usize = 256;

#[derive(Debug)]
pub struct UploadForm {
    pub image: ImageUpload,
    pub language: Option<String>,
}

/// Reads the `file` part (required) and the `language` part (optional) of an
/// image upload. Other parts are drained and ignored.
pub async fn read_upload_form(
    mut payload: Multipart,
    max_file_bytes: usize,
) -> Result<UploadForm, ApiError> {
    let mut image = None;
    let mut language = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        warn!(error = %e, "Malformed multipart payload");
        ApiError::Validation(format!("Invalid multipart payload: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD if image.is_none() => {
                let declared = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_field(&mut field, max_file_bytes, FILE_FIELD).await?;
                debug!(bytes = bytes.len(), content_type = ?declared, "Received image part");
                image = Some(ImageUpload::new(bytes, declared.as_deref()));
            }
            LANGUAGE_FIELD => {
                let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES, LANGUAGE_FIELD).await?;
                let text = String::from_utf8(bytes).map_err(|_| {
                    ApiError::Validation("language must be valid UTF-8".to_string())
                })?;
                language = Some(text);
            }
            other => {
                warn!(field = other, "Ignoring unexpected form field");
                drain(&mut field).await?;
            }
        }
    }

    let image = image.ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))?;
    if image.bytes.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".to_string()));
    }

    Ok(UploadForm { image, language })
}

async fn read_field(field: &mut Field, limit: usize, name: &str) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        ApiError::Validation(format!("Failed to read form field {}: {}", name, e))
    })? {
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge(format!(
                "{} exceeds {} bytes",
                name, limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn drain(field: &mut Field) -> Result<(), ApiError> {
    while field
        .try_next()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart payload: {}", e)))?
        .is_some()
    {}
    Ok(())
}
