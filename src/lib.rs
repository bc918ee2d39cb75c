//! dice-bot - a chat-room dice roller for Matrix
//!
//! Rooms are watched for `.r{dice}d{faces} {label}` commands; each one is
//! evaluated and answered in the room it came from.

pub mod domain;
pub mod application;
pub mod infrastructure;
