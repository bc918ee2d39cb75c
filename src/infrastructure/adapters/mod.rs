//! Platform adapters implementing the transport traits

pub mod console;
pub mod matrix;

pub use console::ConsoleAdapter;
pub use matrix::MatrixAdapter;
