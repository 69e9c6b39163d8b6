//! Shared domain types for the avstudio generation pipeline.
//!
//! Job records and their status rules, voice presets, script metrics and
//! environment parsing helpers. No async code lives here.

pub mod config;
pub mod error;
pub mod job;
pub mod payload;
pub mod preset;
pub mod script;
pub mod types;
