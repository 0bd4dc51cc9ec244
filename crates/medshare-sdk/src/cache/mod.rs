//! Local caches over a [`KeyValueStore`](crate::traits::KeyValueStore)
//!
//! The pending cache holds transfers the ledger has accepted but the index
//! has not yet returned. The metadata cache holds descriptive details the
//! ledger does not carry.

mod metadata;
mod pending;
mod store;

pub use metadata::{MetadataCache, METADATA_KEY_PREFIX};
pub use pending::{PendingCache, PENDING_KEY_PREFIX, SENT_PENDING_KEY_PREFIX};
pub use store::MemoryStore;
#[cfg(feature = "native")]
pub use store::SqliteStore;
