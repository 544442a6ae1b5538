//! Analytics module - read-only reports derived from the chain

mod anomalies;
mod predictions;

pub use anomalies::*;
pub use predictions::*;
