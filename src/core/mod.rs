//! Shared constants and amount helpers

pub mod amount;
pub mod keys;
pub mod sync;
