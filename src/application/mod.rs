//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Session lifecycle and roll handling
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, evaluation, formatting, dispatching

pub mod errors;
pub mod services;
pub mod messaging;
