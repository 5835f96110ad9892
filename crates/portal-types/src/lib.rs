//! Foundation types for PORTAL.
//!
//! This crate contains the platform-agnostic types shared by every PORTAL
//! crate: the error enum, shell configuration, the events delivered to the
//! main looper, and the looper itself.

pub mod config;
pub mod error;
pub mod event;
pub mod looper;
