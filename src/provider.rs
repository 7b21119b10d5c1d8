//! Provider-facing configuration and server-side machinery.
//!
//! `description` exposes validated endpoint metadata ([`ServiceProviderDescription`])
//! consumed by the consumer orchestrator. `issuer` owns the token lifecycle
//! (minting, approval, single-use exchange) and `gate` verifies inbound signed
//! requests end to end (timestamp, nonce, signature).

pub mod description;
pub mod gate;
pub mod issuer;

pub use description::*;
pub use gate::*;
pub use issuer::*;
