//! Settings synchronization engine for the MCP management console.
//!
//! Every settings view in the console goes through the same lifecycle: fetch
//! the current remote value, populate a typed form, validate edits locally,
//! submit the whole form, reconcile with what the server actually persisted,
//! and tell every other open view to refetch. This crate implements that
//! lifecycle once; the individual settings pages are catalog data.
//!
//! ```no_run
//! use std::sync::Arc;
//! use console_settings::{FieldValue, HttpTransport, SettingsEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new("https://console.example.com/api/")?);
//! let engine = SettingsEngine::new(transport);
//!
//! let mut connection = engine.load("connection").await?;
//! connection.update_field("max_connections", FieldValue::Int(150))?;
//! engine.submit(&mut connection).await?;
//! # Ok(())
//! # }
//! ```

mod domain;
mod error;
mod infra;
mod shared;

pub use domain::catalog::{catalog, schema_for, RESOURCE_KEYS};
pub use domain::engine::SettingsEngine;
pub use domain::resource::{SettingsResource, SubmissionResult, SyncState};
pub use domain::schema::{
    FieldKind, FieldSpec, FieldValue, SettingsPayload, SettingsSchema, VisibleWhen,
};
pub use domain::validate::{check_value, validate_payload, validate_resource_key};
pub use error::{FieldViolation, SyncError};
pub use infra::invalidation::{Invalidation, InvalidationHub};
pub use infra::probe::{probe_settings, ProbeReport};
pub use infra::transport::{HttpTransport, SettingsTransport, TransportError};
pub use shared::notice;
