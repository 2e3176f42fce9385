//! Core shared types for heapscope.
//!
//! This crate is intentionally small and dependency-free: humanized
//! formatting for the descriptive strings embedded in reports, a wall-clock
//! helper, and the activity flag the differ and the GC trend monitor share.

pub mod activity;
pub mod human;
pub mod time;

pub use activity::{ActivityFlag, ActivityGuard};
pub use human::{nice_delta, nice_size};
pub use time::unix_seconds;
