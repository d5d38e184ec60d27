//! # rental-core — Foundational Types for the Rental Service
//!
//! Every other crate in the workspace depends on `rental-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `LoanId`, `ItemId`, `UserId`,
//!    `ProtocolId` are distinct types. A tenant's `UserId` cannot be passed
//!    where a `LoanId` is expected.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] stores UTC with seconds
//!    precision, so `created_at`/`updated_at` and transition records compare
//!    and serialize identically regardless of the host timezone.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rental-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{ItemId, LoanId, ProtocolId, UserId};
pub use temporal::Timestamp;
