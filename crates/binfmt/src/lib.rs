mod reader;
mod writer;

pub use reader::{Reader, ReadError};
pub use writer::Writer;
