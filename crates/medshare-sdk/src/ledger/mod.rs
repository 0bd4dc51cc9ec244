//! Ledger access
//!
//! [`LedgerQueryAdapter`] is the only path from ledger sources to canonical
//! records. `remote` implements the collaborator traits over HTTP.

mod adapter;
mod remote;

pub use adapter::{from_contract_entry, from_indexed_event, LedgerQueryAdapter};
