mod display;
mod pixels;

pub use display::{DisplayError, TerminalPixels};
pub use pixels::MemoryPixels;
