//! `wms-core`: shared primitives for the warehouse client.
//!
//! This crate contains **pure** building blocks (no IO, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ApprovalKind, ApprovalRef, DecodedId, decode, decode_opt, encode};
