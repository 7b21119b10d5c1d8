//! Token models: record lifecycle and redacting secret wrapper.

pub mod record;
pub mod secret;
