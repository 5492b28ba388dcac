//! Usage: Infrastructure adapters (REST transport, invalidation pub/sub, health probe).

pub(crate) mod invalidation;
pub(crate) mod probe;
pub(crate) mod transport;
