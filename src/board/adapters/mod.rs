//! Adapter implementations of the board ports.
//!
//! - [`memory`]: thread-safe in-memory adapters
//! - [`postgres`]: Diesel adapters backed by `PostgreSQL`

pub mod memory;
pub mod postgres;
