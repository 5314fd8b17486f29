//! CSV reading for tabular indicator inputs.

mod read;

pub use read::*;
