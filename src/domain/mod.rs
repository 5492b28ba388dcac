//! Usage: Settings-synchronization domain (schemas, validation, resource state, engine, catalog).

pub(crate) mod catalog;
pub(crate) mod engine;
pub(crate) mod resource;
pub(crate) mod schema;
pub(crate) mod validate;
