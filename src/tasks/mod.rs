//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals
//! - Rate limit sweep: Drops records of finished windows

mod cleanup;
mod sweep;

pub use cleanup::spawn_cleanup_task;
pub use sweep::spawn_sweep_task;
