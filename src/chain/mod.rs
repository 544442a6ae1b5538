//! Chain module - block structure, block factory, timestamp format and integrity checks

mod block;
pub mod timestamp;
mod verify;

pub use block::*;
pub use verify::*;
