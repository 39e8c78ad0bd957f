//! Route matching.
//!
//! Patterns are compiled once at startup into [`PathPattern`]s and stored per
//! HTTP method in a [`Router`].

mod error;
mod pattern;
mod table;

pub use error::Error;
pub use pattern::{PathPattern, Segment};
pub use table::{RouteMatch, Router};
