//! Background Tasks Module
//!
//! Long-lived tasks that run alongside the cache engine.

mod cleanup;

pub use cleanup::spawn_sweep_task;
