//! Terminal rendering for the helper process.

mod console;

pub use console::ConsoleView;
