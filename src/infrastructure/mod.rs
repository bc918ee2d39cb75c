//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Credential persistence
//! - Adapters: Platform integrations (Matrix, console)

pub mod config;
pub mod storage;
pub mod adapters;
