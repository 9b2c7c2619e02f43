//! Presence Tracker - hourly presence logging backend
//!
//! Users record how "present" they were for each hour of the day and review
//! daily averages and hourly breakdowns.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `storage`: durable (SeaORM) and volatile (in-memory) entry stores, and
//!   the selector that routes between them
//! - `services`: validation, aggregation and the entry service
//! - `api`: HTTP handlers and middleware
//! - `config`: configuration management
//! - `runtime`: application lifecycle and server mode
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
