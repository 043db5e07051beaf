//! Engine commands: the operations exposed to callers.

pub mod coordination;
pub mod rules;
pub mod sync;
pub mod version;
