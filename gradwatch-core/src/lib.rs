#![doc = "gradwatch-core: core logic library for gradwatch."]

//! Parsing, normalisation, deduplication and the publish/refresh pipelines.
//! Network and storage services are reached only through the traits in
//! [`contract`]; concrete clients live in the `gradwatch` crate.
//!
//! Data flow: document → [`sections`] → [`table`] → [`posting::Posting`]s →
//! region and ledger screening → record store → [`ledger`] persisted.

pub mod age;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod location;
pub mod pipeline;
pub mod posting;
pub mod sections;
pub mod table;

pub use config::HarvestConfig;
pub use error::{HarvestError, LedgerError};
pub use ledger::Ledger;
pub use posting::Posting;
