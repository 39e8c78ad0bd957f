//! Middleware: the [`Middleware`] trait, [`compose`] and a few ready-made
//! layers.

mod builtin;
mod chain;

pub use builtin::{ErrorResponder, RequestLogger, ResponseTime, RESPONSE_TIME_HEADER};
pub use chain::{compose, from_fn, FromFn, Middleware};
