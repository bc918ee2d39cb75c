//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (RollCommand, RollOutcome, Credential)
//! - Traits: Abstractions for infrastructure (Transport, Authenticator, CredentialStore)

pub mod entities;
pub mod traits;
