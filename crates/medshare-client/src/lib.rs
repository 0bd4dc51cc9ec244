//! Rust clients for the services behind medshare document sharing
//!
//! Each external collaborator gets one typed client:
//! - [`PinningClient`]: uploads document bytes, returns a content identifier
//! - [`EventIndexClient`]: indexed transfer events per participant
//! - [`ContractRelayClient`]: the sharing contract's write and read methods
//! - [`RecordsClient`]: patient-records CRUD
//! - [`GuidanceClient`]: symptom guidance from a text-generation endpoint
//!
//! Clients return wire shapes as the services send them. Mapping onto
//! canonical records happens in `medshare-sdk`.
//!
//! # Example
//!
//! ```rust,no_run
//! use medshare_client::{EventIndexClient, ServiceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = EventIndexClient::new(ServiceConfig::new("http://localhost:5001"))?;
//! let events = index.files_for("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").await?;
//! println!("{} events", events.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod guidance;
pub mod ledger;
pub mod records;
pub mod types;

pub use client::HttpService;
pub use error::{ClientError, Result};
pub use gateway::{to_data_url, PinMode, PinningClient};
pub use guidance::{GuidanceClient, GuidanceConfig};
pub use ledger::{ContractRelayClient, EventIndexClient};
pub use records::RecordsClient;
pub use types::*;
