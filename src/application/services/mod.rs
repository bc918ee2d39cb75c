//! Application services - Business logic orchestration

pub mod roll_service;
pub mod session_service;

pub use roll_service::RollService;
pub use session_service::{SessionManager, SessionState};
