//! # Lookup Feature
//!
//! Drug-event lookups against openFDA with concurrent per-name fan-out.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod fanout;
pub mod openfda;
pub mod types;

pub use fanout::{lookup_all, spawn_lookups, FanOutReport, LookupUpdate};
pub use openfda::OpenFdaClient;
pub use types::{DrugEvent, DrugEventLookup};
