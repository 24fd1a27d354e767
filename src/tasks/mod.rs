//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache refresh: re-runs a snapshot cache's fetch at its configured interval

mod refresh;

pub use refresh::spawn_refresh_task;
