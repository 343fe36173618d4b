//! Middleware module

pub mod auth;

pub use auth::RequireApiKey;
