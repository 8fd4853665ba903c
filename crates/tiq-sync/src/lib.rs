//! tiq-sync: live subscription engine for the ticket collection.
//!
//! Bridges the remote managed backend (an opaque subscribe/create/delete
//! capability) and the local [`tiq_core::TicketStore`]. Reads flow one
//! way: remote pushes → engine → store → projections. Writes flow the
//! other way: user intent → engine → remote, with confirmation arriving
//! back through the subscription channel rather than a direct local
//! write.

pub mod config;
pub mod engine;
pub mod memory;
pub mod remote;

pub use config::*;
pub use engine::*;
pub use memory::*;
pub use remote::*;
