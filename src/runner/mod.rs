//! Vendor process runner.

mod context;
mod process;
mod request;
mod state;

pub use context::*;
pub use process::*;
pub use request::*;
pub use state::*;
