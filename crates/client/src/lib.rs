//! `wms-client`
//!
//! **Responsibility:** typed access to the warehouse backend.
//!
//! This crate provides:
//! - A transport that injects the bearer token and handles 401s
//! - Lenient record decoding and normalization into view models
//! - The approval queue aggregated across procurement, inbound and outbound
//! - A fixture data source for running without a backend
//!
//! Session state and navigation live in `wms-auth`; the transport only talks
//! to them through [`wms_auth::SessionStore`] and [`wms_auth::Navigator`].

pub mod api;
pub mod approvals;
pub mod backend;
pub mod config;
pub mod error;
pub mod mock;
pub mod normalize;
pub mod payload;
pub mod records;
pub mod transport;

pub use api::{ApiClient, file_name_from_disposition};
pub use approvals::{ApprovalDetail, ApprovalItem, ApprovalSource, list_approvals};
pub use backend::{ApiRequest, Backend, HttpBackend, Method, RawResponse};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use mock::MockData;
pub use transport::{Transport, unwrap_envelope};
