//! Multi-client scenarios.
//!
//! Every scenario runs several [`App`](crate::App) clients against one
//! in-memory store, sync hub and settings source, so store notifications,
//! relayed requests and settings changes all travel the same paths they do
//! in a live session.
//!
//! ```bash
//! cargo test -p questlog-engine --lib e2e_tests
//! ```

mod quest_lifecycle_tests;
mod visibility_tests;
