//! Error types for the medshare SDK

use medshare_client::ClientError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, ShareError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum ShareError {
    /// No participant identity is established
    #[error("No wallet connected")]
    NoIdentity,

    /// Address failed syntax or checksum validation
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No file was selected for upload
    #[error("No file selected")]
    NoFile,

    /// File could not be read or encoded
    #[error("Could not read file: {0}")]
    FileRead(String),

    /// Pinning gateway rejected or did not identify the content
    #[error("Content upload failed: {0}")]
    Upload(String),

    /// Ledger write was rejected, reverted or unreachable
    #[error("Ledger write failed: {0}")]
    LedgerWrite(String),

    /// Both the event index and the contract read failed
    #[error("Ledger query failed (index: {primary}; contract: {fallback})")]
    LedgerQuery { primary: String, fallback: String },

    /// Timestamp could not be normalised
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Record is missing a required field
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Collaborator could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator did not answer before the deadline
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Collaborator answered with an error
    #[error("Service error: {0}")]
    Service(String),

    /// Local store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShareError {
    /// Whether the workflow was refused before it started
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ShareError::NoIdentity | ShareError::InvalidAddress(_) | ShareError::NoFile
        )
    }

    /// Actionable message for the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            ShareError::NoIdentity => "Please connect your wallet first.".into(),
            ShareError::InvalidAddress(_) => {
                "Invalid receiver address. It must start with 0x and be 42 characters long.".into()
            }
            ShareError::NoFile => "Please select a file first.".into(),
            ShareError::FileRead(_) => "The selected file could not be read. Choose another file.".into(),
            ShareError::Upload(_) => {
                "Upload failed. Check your network connection and try again.".into()
            }
            ShareError::LedgerWrite(_) => {
                "Ledger write failed. Check your wallet balance and confirm the transaction.".into()
            }
            ShareError::Timeout(_) => "The request took too long. Please try again.".into(),
            ShareError::LedgerQuery { .. } | ShareError::Network(_) => {
                "Could not reach the ledger. Check your network connection.".into()
            }
            other => format!("Something went wrong: {}", other),
        }
    }
}

impl From<ClientError> for ShareError {
    fn from(err: ClientError) -> Self {
        if let ClientError::Timeout(after) = err {
            return ShareError::Timeout(after);
        }
        if err.is_connectivity() {
            ShareError::Network(err.to_string())
        } else {
            ShareError::Service(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(err: serde_json::Error) -> Self {
        ShareError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ShareError {
    fn from(err: toml::de::Error) -> Self {
        ShareError::Config(err.to_string())
    }
}

#[cfg(feature = "native")]
impl From<rusqlite::Error> for ShareError {
    fn from(err: rusqlite::Error) -> Self {
        ShareError::Storage(err.to_string())
    }
}
