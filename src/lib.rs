//! Agent Bridge - stream chat turns through external AI agent CLIs.

pub mod config;
pub mod display;
pub mod runner;
pub mod shell;
pub mod store;
pub mod stream;
pub mod vendor;
