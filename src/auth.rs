//! Auth-domain identifiers, consumer identities, and token models.

pub mod consumer;
pub mod id;
pub mod token;

pub use consumer::*;
pub use id::*;
pub use token::{record::*, secret::*};
