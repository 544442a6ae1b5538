//! Validation module - transaction types, the state-transition function and admission

mod processor;
mod transaction;
mod validator;

pub use processor::*;
pub use transaction::*;
pub use validator::*;
