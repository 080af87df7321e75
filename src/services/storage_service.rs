use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::services::baas::{BaasClient, BaasError};

pub const PET_IMAGES_BUCKET: &str = "pet-images";
pub const PROFILE_IMAGES_BUCKET: &str = "profile-images";
pub const PET_PLACEHOLDER: &str = "/assets/img/pet-placeholder.svg";

const CACHE_CONTROL_SECONDS: &str = "3600";

/// An object to upload, as received from a multipart form.
pub struct UploadObject<'a> {
    pub path: &'a str,
    pub bytes: Vec<u8>,
    pub content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

/// Uploads without overwriting; returns the stored path inside the bucket.
pub async fn upload_object(
    client: &BaasClient,
    access_token: &str,
    bucket: &str,
    object: UploadObject<'_>,
) -> Result<String, BaasError> {
    let path = format!("storage/v1/object/{}/{}", bucket, object.path);
    let (url, req) = client.request(Method::POST, &path, Some(access_token));
    let size = object.bytes.len();
    let resp: UploadResponse = client
        .send_json(
            &url,
            req.header("cache-control", format!("max-age={}", CACHE_CONTROL_SECONDS))
                .header("x-upsert", "false")
                .header(reqwest::header::CONTENT_TYPE, object.content_type)
                .body(object.bytes),
        )
        .await?;
    info!("🖼️ Uploaded {}/{} ({} bytes)", bucket, object.path, size);

    // The API answers with "<bucket>/<path>"; callers store the bare path.
    let stored = resp
        .key
        .as_deref()
        .and_then(|k| k.strip_prefix(&format!("{}/", bucket)).map(str::to_string))
        .unwrap_or_else(|| object.path.to_string());
    Ok(stored)
}

pub async fn remove_objects(
    client: &BaasClient,
    access_token: &str,
    bucket: &str,
    paths: &[String],
) -> Result<(), BaasError> {
    let prefixes: Vec<&str> = paths
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty() && !p.starts_with("http"))
        .collect();
    if prefixes.is_empty() {
        return Ok(());
    }

    let path = format!("storage/v1/object/{}", bucket);
    let (url, req) = client.request(Method::DELETE, &path, Some(access_token));
    client
        .send_empty(&url, req.json(&json!({ "prefixes": prefixes })))
        .await?;
    info!("🗑️ Removed {} object(s) from {}", prefixes.len(), bucket);
    Ok(())
}

/// Browser URL for a stored object. Absolute URLs pass through; a missing
/// path becomes the placeholder image.
pub fn public_url(base_url: &str, bucket: &str, path: Option<&str>) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        None => PET_PLACEHOLDER.to_string(),
        Some(p) if p.starts_with("http") => p.to_string(),
        Some(p) => format!(
            "{}/storage/v1/object/public/{}/{}",
            base_url.trim_end_matches('/'),
            bucket,
            p.trim_start_matches('/')
        ),
    }
}
