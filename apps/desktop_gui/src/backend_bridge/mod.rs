//! Bridge between the UI thread and the backend worker that owns the contract binding.

pub mod commands;
pub mod runtime;
