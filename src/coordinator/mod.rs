//! Periodic refresh of one location's measurements: the coordinator that owns the
//! published snapshot, the listeners it notifies, and the scheduler that drives it.

pub mod listeners;
pub mod outcome;
pub mod refresh_coordinator;
pub mod scheduler;
