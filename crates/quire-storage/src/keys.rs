//! Shared key generation for storage backends.

use uuid::Uuid;

/// Uploaded media is immutable under its key, so it may be cached for a year.
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

const MAX_BASE_NAME_LEN: usize = 80;

/// Top-level folder for a MIME type.
pub fn folder_for_content_type(content_type: &str) -> &'static str {
    let ct = content_type.to_lowercase();
    if ct.contains("audio") {
        "audio"
    } else if ct.contains("video") {
        "video"
    } else if ct.contains("image") {
        "image"
    } else {
        "other"
    }
}

/// `{folder}/{base}-{uuid}{ext}` for an uploaded file.
///
/// The base name is reduced to characters that are safe in both S3 keys and
/// filesystem paths, so a hostile file name cannot escape its folder.
pub fn generate_media_key(content_type: &str, original_file_name: &str) -> String {
    let file_name = original_file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_file_name);
    let (base, ext) = match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    };
    let base = sanitize(base, MAX_BASE_NAME_LEN);
    let ext = sanitize(ext.trim_start_matches('.'), 16);
    let ext = if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext.to_lowercase())
    };
    let base = if base.is_empty() { "file".to_string() } else { base };

    format!(
        "{}/{}-{}{}",
        folder_for_content_type(content_type),
        base,
        Uuid::new_v4(),
        ext
    )
}

fn sanitize(input: &str, max_len: usize) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect()
}
