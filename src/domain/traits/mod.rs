//! Domain traits - Abstractions for infrastructure implementations

pub mod store;
pub mod transport;

pub use store::CredentialStore;
pub use transport::{Authenticator, SyncBatch, Transport};
