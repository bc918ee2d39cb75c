//! Message handling - Roll command pipeline and room dispatch

pub mod dispatcher;
pub mod evaluator;
pub mod formatter;
pub mod parser;

pub use dispatcher::RoomDispatcher;
pub use evaluator::evaluate;
pub use formatter::format_reply;
pub use parser::parse_roll;
