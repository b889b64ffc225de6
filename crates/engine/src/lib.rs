//! Questlog engine library.
//!
//! Client-side quest log engine: a per-user cache of the quests that user can
//! observe, kept current from store notifications, plus the relay that lets
//! players request changes only a GM may apply.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping store operations
//! - `stores/` - Runtime state (the quest cache)
//! - `use_cases/` - User story orchestration across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Sync channel entry points
//! - `app` - Client composition

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

/// Test fixtures module for integration testing.
#[cfg(test)]
pub mod test_fixtures;

/// Multi-client scenarios over the in-memory adapters.
#[cfg(test)]
mod e2e_tests;

pub use app::{App, Ports};
