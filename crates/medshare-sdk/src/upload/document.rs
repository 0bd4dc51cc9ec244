//! Encoded document ready for pinning

use crate::error::{Result, ShareError};
use std::path::Path;

/// File contents plus the name and type the gateway is told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedDocument {
    /// Read and encode the file at `path`
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ShareError::FileRead(format!("{}: {}", path.display(), e)))?;

        if bytes.is_empty() {
            return Err(ShareError::FileRead(format!("{} is empty", path.display())));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        Ok(Self::from_bytes(file_name, bytes))
    }

    /// Wrap in-memory contents, sniffing the MIME type
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = sniff_mime_type(&file_name, &bytes).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        medshare_client::to_data_url(&self.mime_type, &self.bytes)
    }
}

/// Guess a MIME type from magic bytes, then the extension
pub fn sniff_mime_type(file_name: &str, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if bytes.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif";
    }

    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "json" => "application/json",
        "dcm" => "application/dicom",
        _ => "application/octet-stream",
    }
}
