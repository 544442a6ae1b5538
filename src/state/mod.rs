//! State module - inventory projection and chain replay

mod inventory;
mod replay;

pub use inventory::*;
pub use replay::*;
