//! Pinning gateway client
//!
//! Uploads document bytes and returns the content identifier the gateway
//! assigned. A response without an identifier is a failure: callers must
//! never record a reference to content that was not pinned.

use crate::client::{handle_response, HttpService};
use crate::error::{ClientError, Result};
use crate::types::{DataUrlUpload, PinResponse, PinUpload, ServiceConfig};
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

/// How documents are handed to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    /// `POST /pin` with a multipart `file` field
    #[default]
    Multipart,
    /// `POST /share` with a base64 data URL in JSON
    DataUrl,
}

/// Pinning gateway client
#[derive(Debug, Clone)]
pub struct PinningClient {
    service: HttpService,
    mode: PinMode,
}

impl PinningClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(config)?,
            mode: PinMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: PinMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Pin a document and return its content identifier
    pub async fn pin(&self, upload: &PinUpload) -> Result<String> {
        let response = match self.mode {
            PinMode::Multipart => self.pin_multipart(upload).await?,
            PinMode::DataUrl => self.pin_data_url(upload).await?,
        };

        match response.content_id {
            Some(cid) if !cid.trim().is_empty() => {
                tracing::debug!(cid = %cid, bytes = upload.bytes.len(), "Pinned document");
                Ok(cid)
            }
            _ => Err(ClientError::InvalidResponse(
                "pinning gateway returned no content identifier".to_string(),
            )),
        }
    }

    async fn pin_multipart(&self, upload: &PinUpload) -> Result<PinResponse> {
        let file = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let metadata = serde_json::json!({ "name": upload.pin_name });

        let form = Form::new()
            .part("file", file)
            .text("metadata", metadata.to_string());

        let response = self
            .service
            .http()
            .post(self.service.url("pin"))
            .multipart(form)
            .send()
            .await?;

        handle_response(response).await
    }

    async fn pin_data_url(&self, upload: &PinUpload) -> Result<PinResponse> {
        let data_url = to_data_url(&upload.mime_type, &upload.bytes);
        self.service
            .post_json("share", &DataUrlUpload { file_data: &data_url })
            .await
    }
}

/// Encode bytes as a `data:<mime>;base64,<payload>` URL
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encoding() {
        assert_eq!(to_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
