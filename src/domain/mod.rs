//! Domain models

pub mod deploy;
pub mod features;

pub use deploy::{Credentials, RemoteTarget, RepoDescriptor};
