//! Core domain types
//!
//! This module contains the core domain structures used across mlpipe services.
//! These types represent the fundamental business entities and are shared between
//! the dispatcher (for routing and persistence) and its clients.

pub mod action;
pub mod artifact;
pub mod job;
pub mod metric;
pub mod network;
pub mod trigger;
