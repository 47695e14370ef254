//! Service Module
//!
//! Business logic layer for the dispatcher.
//! Services orchestrate between repositories and contain domain logic.

pub mod dispatch;
pub mod intake;
pub mod job;
pub mod lifecycle;
pub mod monitoring;
pub mod network;
pub mod router;
