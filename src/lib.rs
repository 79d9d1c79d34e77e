//! Globethrottle - Approximate Global Rate Limiting
//!
//! This crate implements an eventually consistent rate limiter shared by a
//! cluster of independent nodes. Each node counts events locally in a
//! per-key sliding window and broadcasts occurrences to its peers over UDP;
//! an admission decision combines the local count with a short grace wait
//! for corroborating remote events. There is no central coordinator, no
//! consensus protocol, and no persistent storage.

pub mod config;
pub mod error;
pub mod event;
pub mod exchange;
pub mod hammer;
pub mod ratelimit;
