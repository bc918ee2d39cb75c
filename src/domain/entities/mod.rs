//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod outcome;
pub mod session;

pub use command::{RollCommand, DEFAULT_DICE, DEFAULT_FACES};
pub use message::{IncomingMessageEvent, MessageKind};
pub use outcome::{RejectReason, RollOutcome};
pub use session::{Credential, RoomHandle};
