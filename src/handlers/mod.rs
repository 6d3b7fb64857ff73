//! # Handler and payload types.
//!
//! - [`Handler`] - named, tagged unit of behavior (`Sync` or `Async`) invoked per posted event
//! - [`HandlerKind`] - which variant a handler is
//! - [`Payload`] - shared, immutable event data handed to every handler

mod handler;
mod payload;

pub use handler::{BoxHandlerFuture, Handler, HandlerKind};
pub use payload::Payload;
