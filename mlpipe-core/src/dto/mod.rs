//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used on the wire between the dispatcher, its CLI,
//! and the external compute, storage and monitoring services.

pub mod compute;
pub mod job;
pub mod lifecycle;
pub mod trigger;
