//! Seams between the sharing core and its collaborators
//!
//! The core never talks HTTP or SQLite directly. It is handed
//! implementations of these traits; `crate::ledger::remote` provides the
//! HTTP-backed ones and `crate::cache::store` the storage ones.

mod ledger;
mod pinning;
mod store;

pub use ledger::{LedgerContract, LedgerIndex};
pub use pinning::ContentPinner;
pub use store::KeyValueStore;
