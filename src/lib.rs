//! Shortener - a URL shortening service
//!
//! Keys are the base62 form of the store-assigned record id, so creation
//! never checks for collisions. Writes go to a primary store, reads to a
//! replica behind a write-through cache, and a Bloom filter shared between
//! instances tracks every key handed out.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: maintenance subcommands
//!
//! # Architecture
//! - `codec`: base62 key encoding
//! - `storage`: identifier store, primary/replica routing
//! - `cache`: URL cache and membership filter
//! - `services`: shorten / resolve orchestration
//! - `api`: HTTP handlers and middleware
//! - `config`: configuration loading
//! - `runtime`: startup, shutdown and execution modes
//! - `system`: logging

pub mod api;
pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
