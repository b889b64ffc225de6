//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod memory_channel;
pub mod memory_store;
pub mod ports;
pub mod settings;
