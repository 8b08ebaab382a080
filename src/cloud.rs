//! Client side of the hosted upload and background-removal service.

use serde::Deserialize;

use crate::config::CloudConfig;

/// Upload API root; the cloud account name and `/image/upload` follow.
pub const UPLOAD_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Delivery path that asks the service to strip the background and scale
/// the result down. `{public_id}.{format}` is appended.
pub const PROCESSED_URL_BASE: &str =
    "https://res.cloudinary.com/daadydi5p/image/upload/e_bgremoval,c_scale";

#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// An image picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceError {
    pub message: String,
}

/// JSON body returned by the upload endpoint.
///
/// An `error` object takes precedence over any other fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Rejected { error: ServiceError },
    Uploaded { public_id: String, format: String },
}

pub fn upload_endpoint(cloud_name: &str) -> String {
    upload_endpoint_at(UPLOAD_API_BASE, cloud_name)
}

fn upload_endpoint_at(api_base: &str, cloud_name: &str) -> String {
    format!("{api_base}/{cloud_name}/image/upload")
}

pub fn processed_image_url(public_id: &str, format: &str) -> String {
    format!("{PROCESSED_URL_BASE}/{public_id}.{format}")
}

pub fn parse_upload_response(body: &[u8]) -> Result<UploadResponse, CloudError> {
    serde_json::from_slice(body).map_err(|e| CloudError::Decode(e.to_string()))
}

/// Send `file` to the upload endpoint as multipart form data.
///
/// The body is parsed whatever the HTTP status, since the service reports
/// its own failures in the JSON `error` object.
pub async fn upload(
    client: &reqwest::Client,
    config: &CloudConfig,
    file: SelectedFile,
) -> Result<UploadResponse, CloudError> {
    upload_to(client, UPLOAD_API_BASE, config, file).await
}

async fn upload_to(
    client: &reqwest::Client,
    api_base: &str,
    config: &CloudConfig,
    file: SelectedFile,
) -> Result<UploadResponse, CloudError> {
    let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("upload_preset", config.upload_preset.clone());

    let response = client
        .post(upload_endpoint_at(api_base, &config.cloud_name))
        .multipart(form)
        .send()
        .await
        .map_err(|e| CloudError::Network(e.to_string()))?;

    log::debug!("Upload answered with HTTP {}", response.status());

    let body = response
        .bytes()
        .await
        .map_err(|e| CloudError::Network(e.to_string()))?;
    parse_upload_response(&body)
}

/// Download the bytes behind a processed-image URL.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, CloudError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CloudError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CloudError::Network(format!(
            "HTTP status: {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CloudError::Network(e.to_string()))?;
    Ok(bytes.to_vec())
}
