//! AI guidance client
//!
//! Sends a symptom description to a generateContent-style endpoint and
//! returns the free-text answer. The request races an explicit deadline;
//! losing the race is reported as [`ClientError::Timeout`].

use crate::client::{handle_response, HttpService};
use crate::error::{ClientError, Result};
use crate::types::{
    GenerateContent, GeneratePart, GenerateRequest, GenerateResponse, ServiceConfig, SymptomReport,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Guidance endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Full generateContent URL
    pub endpoint: String,
    /// API key, sent as the `key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,
    /// Deadline for one answer in seconds (default: 30)
    #[serde(default = "default_guidance_timeout")]
    pub timeout_secs: u64,
}

fn default_guidance_timeout() -> u64 {
    30
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                .to_string(),
            api_key: None,
            timeout_secs: default_guidance_timeout(),
        }
    }
}

impl SymptomReport {
    /// All four fields must be filled in
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("symptoms", &self.symptoms),
            ("medical history", &self.medical_history),
            ("duration", &self.duration),
            ("severity", &self.severity),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ClientError::InvalidRequest(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    /// Natural-language prompt for the model
    pub fn prompt(&self) -> String {
        format!(
            "According to your knowledge if a person has these {}, with the medical history {}, \
             and from the duration of {}, and with {} severity, could you please provide more \
             details or advice on how to manage or treat the condition?",
            self.symptoms.trim(),
            self.medical_history.trim(),
            self.duration.trim(),
            self.severity.trim(),
        )
    }
}

/// Client for the AI guidance service
#[derive(Debug, Clone)]
pub struct GuidanceClient {
    service: HttpService,
    api_key: Option<String>,
    timeout: Duration,
}

impl GuidanceClient {
    pub fn new(config: GuidanceConfig) -> Result<Self> {
        let service = HttpService::without_timeout(ServiceConfig {
            base_url: config.endpoint,
            api_key: None,
            timeout_secs: config.timeout_secs,
        })?;

        Ok(Self {
            service,
            api_key: config.api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Override the answer deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask for guidance about a symptom report
    pub async fn advise(&self, report: &SymptomReport) -> Result<String> {
        report.validate()?;
        self.generate(&report.prompt()).await
    }

    /// Send a raw prompt
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Guidance request timed out");
                Err(ClientError::Timeout(self.timeout))
            }
        }
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![GenerateContent {
                parts: vec![GeneratePart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let mut request = self.service.http().post(&self.service.config().base_url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response: GenerateResponse = handle_response(request.send().await?).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ClientError::InvalidResponse("guidance response has no answer text".into()))
    }
}
