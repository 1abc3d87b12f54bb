//! CLI command implementations.

pub mod add;
pub mod check;
pub mod common;
pub mod splice;
pub mod types;
