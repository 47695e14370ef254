//! mlpipe Core
//!
//! Core types and abstractions for the mlpipe training/inference dispatcher.
//!
//! This crate contains:
//! - Domain types: Triggers, Actions, job records, networks, metrics
//! - DTOs: Data transfer objects for inter-service communication

pub mod domain;
pub mod dto;
