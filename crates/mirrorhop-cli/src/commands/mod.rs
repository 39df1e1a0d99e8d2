//! Command implementations.

pub mod probe;
pub mod resolve;
