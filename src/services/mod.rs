//! Service layer module
//!
//! Core deployment logic

pub mod deploy;
