//! Initialization primitives shared by every toolkit component.
//!
//! [`AsyncInitializer`] is the single concurrency primitive of the toolkit:
//! the protocol client and the toolkit base each own one and treat it as a
//! black box that serializes discovery.

#![warn(missing_docs, clippy::pedantic)]

mod attempt;
mod initializer;

pub use attempt::AttemptId;
pub use initializer::{AsyncInitializer, InitPhase};
