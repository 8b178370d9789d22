//! `genusdb-core`: domain primitives shared by every genusdb crate.
//!
//! This crate contains **pure domain** types (no transport, no storage).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{Genus, Subject};
