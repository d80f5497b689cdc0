//! Vendor-agnostic stream plumbing: line framing and the normalized event model.

mod events;
mod framer;

pub use events::*;
pub use framer::*;
