//! Output rendering

mod terminal;

pub use terminal::{quality_tier, TerminalRenderer};
