//! Infrastructure module
//!
//! Wraps external dependencies (subprocess execution)

pub mod command;

pub use command::CommandRunner;
