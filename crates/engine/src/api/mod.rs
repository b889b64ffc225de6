//! Entry points from other clients.
//!
//! `relay` decides between local execution and relaying to a GM, and turns
//! incoming sync messages into store mutations or view refreshes.

pub mod relay;

pub use relay::{Dispatch, NoticeLevel, Relay, ViewEvent};
