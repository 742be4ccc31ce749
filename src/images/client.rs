use super::mime::detect_image_mime;
use super::{delivery_url, ImageHostService};
use crate::models::{ApiCredentials, ApiResponse, Config, ImageList, RemoteAsset, UploadedImage};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

struct Delivery {
    account_hash: String,
    variant: String,
}

/// REST client for the Images v1 API.
///
/// No request timeout is applied; a stalled call stalls the operation.
pub struct CloudflareImagesClient {
    client: Client,
    credentials: ApiCredentials,
    delivery: Option<Delivery>,
    base_url: String,
}

impl CloudflareImagesClient {
    /// Full client able to upload and compose delivery URLs.
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            credentials: config.credentials.clone(),
            delivery: Some(Delivery {
                account_hash: config.account_hash.clone(),
                variant: config.default_variant.clone(),
            }),
            base_url: config.api_base_url.clone(),
        }
    }

    /// List/delete-only client; uploads fail with [`Error::Config`].
    pub fn with_credentials(credentials: ApiCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            delivery: None,
            base_url: crate::models::DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn images_url(&self) -> String {
        format!(
            "{}/accounts/{}/images/v1",
            self.base_url, self.credentials.account_id
        )
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.credentials.api_token)
    }

    async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Images API response: {}\nBody: {}", e, body);
            Error::RemoteApi(format!("Failed to parse Images API response: {}", e))
        })
    }

    async fn error_text(response: Response) -> Result<String> {
        let status = response.status();
        let error_text = response.text().await?;
        Ok(format!("status {}: {}", status, error_text))
    }
}

#[async_trait]
impl ImageHostService for CloudflareImagesClient {
    async fn upload_image(&self, data: &[u8], file_name: &str) -> Result<String> {
        let delivery = self.delivery.as_ref().ok_or_else(|| {
            Error::Config("CF_ACCOUNT_HASH is required to upload images".to_string())
        })?;

        let part = Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(detect_image_mime(data))?;
        let form = Form::new()
            .part("file", part)
            .text("requireSignedURLs", "false");

        tracing::debug!("Uploading {} ({} bytes)", file_name, data.len());

        let response = self
            .client
            .post(self.images_url())
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let detail = Self::error_text(response).await?;
            tracing::error!("Image upload rejected ({})", detail);
            return Err(Error::Upload(detail));
        }

        let parsed: ApiResponse<UploadedImage> = Self::parse_body(response).await?;
        let image = parsed
            .result
            .ok_or_else(|| Error::Upload("No result in upload response".to_string()))?;

        Ok(delivery_url(
            &delivery.account_hash,
            &image.id,
            &delivery.variant,
        ))
    }

    async fn list_images(&self) -> Result<Vec<RemoteAsset>> {
        let response = self
            .client
            .get(self.images_url())
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send list request: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let detail = Self::error_text(response).await?;
            return Err(Error::RemoteApi(format!(
                "Failed to list images ({})",
                detail
            )));
        }

        let parsed: ApiResponse<ImageList> = Self::parse_body(response).await?;
        Ok(parsed.result.map(|list| list.images).unwrap_or_default())
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.images_url(), id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = Self::error_text(response).await?;
            return Err(Error::RemoteApi(format!(
                "Failed to delete image {} ({})",
                id, detail
            )));
        }

        Ok(())
    }
}
