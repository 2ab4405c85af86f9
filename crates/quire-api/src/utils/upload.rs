//! Multipart upload parsing

use crate::services::MediaUpload;
use axum::extract::Multipart;
use quire_core::AppError;

/// Read a media upload: exactly one `file` part plus the optional `title`,
/// `description` and `category` text fields. Unknown parts are skipped.
pub async fn extract_media_upload(mut multipart: Multipart) -> Result<MediaUpload, AppError> {
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;
    let mut title = None;
    let mut description = None;
    let mut category = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let file_name = field
                    .file_name()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s: &str| normalize_mime_type(s).to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::InvalidInput(format!("Failed to read file data: {}", e))
                    })?;
                file = Some((file_name, content_type, data));
            }
            "title" | "description" | "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| {
                        let message = format!("Failed to read field {}: {}", field_name, e);
                        AppError::InvalidInput(message)
                    })?;
                match field_name.as_str() {
                    "title" => title = Some(value),
                    "description" => description = Some(value),
                    _ => category = Some(value),
                }
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(MediaUpload {
        file_name,
        content_type,
        data,
        title,
        description,
        category,
    })
}

/// Strip MIME parameters: `video/mp4; codecs=avc1` becomes `video/mp4`.
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}
