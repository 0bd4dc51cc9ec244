//! Command-line arguments
//!
//! Flags and environment variables are layered over the TOML file given by
//! `--config`, which is itself layered over the built-in defaults.

use clap::{Parser, Subcommand};
use medshare_sdk::{CacheBackend, ServiceConfig, ShareConfig};
use std::path::PathBuf;

/// medshare - share medical documents over a ledger
#[derive(Parser, Debug, Clone)]
#[command(name = "medshare")]
#[command(about = "Share medical documents through a pinning gateway and a sharing contract")]
pub struct Args {
    /// TOML configuration file
    #[arg(long, env = "MEDSHARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Connected wallet address
    #[arg(long, env = "MEDSHARE_PARTICIPANT")]
    pub participant: Option<String>,

    /// Pinning gateway base URL
    #[arg(long, env = "MEDSHARE_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Pinning gateway API key
    #[arg(long, env = "MEDSHARE_GATEWAY_KEY", hide_env_values = true)]
    pub gateway_key: Option<String>,

    /// Event-index service base URL
    #[arg(long, env = "MEDSHARE_INDEX_URL")]
    pub index_url: Option<String>,

    /// Contract relay base URL
    #[arg(long, env = "MEDSHARE_CONTRACT_URL")]
    pub contract_url: Option<String>,

    /// Patient-records service base URL
    #[arg(long, env = "MEDSHARE_RECORDS_URL")]
    pub records_url: Option<String>,

    /// API key for the guidance endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub guidance_key: Option<String>,

    /// Pending cache database path
    #[arg(long, env = "MEDSHARE_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    /// Keep the pending cache in memory only
    #[arg(long, env = "MEDSHARE_MEMORY_CACHE", default_value = "false")]
    pub memory_cache: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Documents you have shared
    Sent,

    /// Documents shared with you
    Received,

    /// Share a document with another participant
    Share {
        /// File to share
        file: PathBuf,

        /// Receiver wallet address
        #[arg(long)]
        to: String,

        #[arg(long)]
        patient_name: Option<String>,

        #[arg(long)]
        document_type: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Poll the ledger and print view changes until interrupted
    Watch {
        /// Polling interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Transfers not yet confirmed by the ledger index
    Pending,

    /// Forget pending transfers
    ClearPending {
        /// Clear for every participant, not just the connected one
        #[arg(long)]
        all: bool,
    },

    /// Sharing activity over the last days
    Summary {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Ask for first-aid guidance about symptoms
    Guidance {
        #[arg(long)]
        symptoms: String,

        #[arg(long)]
        history: String,

        #[arg(long)]
        duration: String,

        #[arg(long)]
        severity: String,
    },

    /// Patient records
    Patients {
        #[command(subcommand)]
        action: PatientAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PatientAction {
    List,
    Show { id: String },
    /// Create from a JSON file holding the patient fields
    Create { file: PathBuf },
    Delete { id: String },
}

impl Args {
    /// Build the effective configuration
    pub fn share_config(&self) -> anyhow::Result<ShareConfig> {
        let mut config = match &self.config {
            Some(path) => ShareConfig::load(path)?,
            None => ShareConfig::default(),
        };

        if let Some(participant) = &self.participant {
            config.participant = Some(participant.clone());
        }
        if let Some(url) = &self.gateway_url {
            config.gateway.service = with_url(&config.gateway.service, url);
        }
        if let Some(key) = &self.gateway_key {
            config.gateway.service.api_key = Some(key.clone());
        }
        if let Some(url) = &self.index_url {
            config.index = with_url(&config.index, url);
        }
        if let Some(url) = &self.contract_url {
            config.contract = with_url(&config.contract, url);
        }
        if let Some(url) = &self.records_url {
            config.records = with_url(&config.records, url);
        }
        if let Some(key) = &self.guidance_key {
            config.guidance.api_key = Some(key.clone());
        }
        if let Some(path) = &self.cache_path {
            config.cache.path = path.clone();
        }
        if self.memory_cache {
            config.cache.backend = CacheBackend::Memory;
        }

        config.validate()?;
        Ok(config)
    }
}

fn with_url(service: &ServiceConfig, url: &str) -> ServiceConfig {
    ServiceConfig {
        base_url: url.to_string(),
        ..service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "medshare",
            "--participant",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "--index-url",
            "https://index.example.org",
            "--memory-cache",
            "sent",
        ]);
        let config = args.share_config().unwrap();
        assert_eq!(config.index.base_url, "https://index.example.org");
        assert_eq!(config.contract.base_url, "http://localhost:5001");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(matches!(args.command, Command::Sent));
    }

    #[test]
    fn test_share_requires_receiver() {
        assert!(Args::try_parse_from(["medshare", "share", "scan.pdf"]).is_err());
        let args = Args::try_parse_from(["medshare", "share", "scan.pdf", "--to", "0xabc"]).unwrap();
        assert!(matches!(args.command, Command::Share { .. }));
    }
}
