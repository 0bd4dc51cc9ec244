//! Document share workflow

mod document;
mod orchestrator;

pub use document::{sniff_mime_type, EncodedDocument};
pub use orchestrator::{
    UploadDetails, UploadOrchestrator, UploadProgress, UploadReceipt, UploadRequest, UploadState,
    UploadStep,
};
