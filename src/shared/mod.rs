//! Usage: Cross-cutting utilities shared across domains (low-level helpers, pure logic).

pub(crate) mod mutex_ext;
pub mod notice;
pub(crate) mod time;
