//! Scheduler layer for the dispatcher
//!
//! Periodic work that runs next to the HTTP intake: the built-in retraining
//! schedule, alarm evaluation, and the stale-pending reaper.

pub mod background;

pub use background::{BackgroundSettings, BackgroundTasks};
