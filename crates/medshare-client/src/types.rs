//! Wire types for collaborator APIs
//!
//! These mirror what each service actually sends. Field naming differs
//! between services (`cid` vs `content`, numeric vs hex timestamps); the
//! SDK maps them onto its canonical record at the boundary.

use serde::{Deserialize, Serialize};

/// Connection settings for one collaborator service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ==================== Ledger ====================

/// Timestamp as it arrives on the wire
///
/// Event indexes send plain integers; contract reads send fixed-width hex
/// strings or a `{ "hex": "0x..", "type": "BigNumber" }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Integer(u64),
    Text(String),
    BigNumber { hex: String },
}

impl From<u64> for RawTimestamp {
    fn from(value: u64) -> Self {
        RawTimestamp::Integer(value)
    }
}

/// Entry from `GET /files/{address}` on the event-index service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFileEvent {
    pub sender: String,
    pub receiver: String,
    pub cid: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub timestamp: RawTimestamp,
}

/// Entry returned by the contract's `getFiles` read method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFileEntry {
    pub sender: String,
    pub receiver: String,
    #[serde(alias = "content")]
    pub cid: String,
    pub timestamp: RawTimestamp,
}

/// Body for the contract's `addFileToIPFS` write method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileRequest {
    pub sender: String,
    pub receiver: String,
    pub cid: String,
}

/// Confirmation of a ledger write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFileReceipt {
    pub tx_hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
}

// ==================== Pinning ====================

/// Document ready to be sent to the pinning gateway
#[derive(Debug, Clone)]
pub struct PinUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type of the content
    pub mime_type: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
    /// Display name recorded by the gateway
    pub pin_name: String,
}

/// Gateway answer to a pin request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "contentId", alias = "IpfsHash", alias = "cid", default)]
    pub content_id: Option<String>,
    #[serde(rename = "PinSize", default, skip_serializing_if = "Option::is_none")]
    pub pin_size: Option<u64>,
}

/// Legacy `/share` request carrying a data URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DataUrlUpload<'a> {
    pub file_data: &'a str,
}

// ==================== Patient records ====================

/// Patient gender, as constrained by the records service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "non-binary")]
    NonBinary,
    Other,
}

/// Stored patient record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_type: String,
    pub department: String,
    pub allergies: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub room_temperature: String,
    #[serde(default)]
    pub body_temperature: String,
    #[serde(default)]
    pub oxygen_level: String,
    #[serde(default)]
    pub bmi: String,
    #[serde(default)]
    pub heart_rate: String,
    #[serde(default)]
    pub doctor_notes: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Input for creating a patient record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_type: String,
    pub department: String,
    pub allergies: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room_temperature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_temperature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub oxygen_level: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bmi: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub heart_rate: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_notes: String,
}

// ==================== AI guidance ====================

/// Symptom description used to build a guidance prompt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomReport {
    pub symptoms: String,
    pub medical_history: String,
    pub duration: String,
    pub severity: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub contents: Vec<GenerateContent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GenerateContent {
    #[serde(default)]
    pub parts: Vec<GeneratePart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeneratePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateCandidate {
    pub content: Option<GenerateContent>,
}
