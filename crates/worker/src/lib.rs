//! Job executors for the script, audio and video stages.
//!
//! [`PipelineExecutor`] is the [`avstudio_events::JobExecutor`] the job
//! store runs for every new job. It picks the strategy for the job's type,
//! reports progress on a fixed schedule, asks the generation backend for
//! the artifact and falls back to canned media when the backend is
//! unavailable.

pub mod config;
pub mod demo;
pub mod executor;
mod media;
mod schedule;
mod strategy;

pub use config::ExecutorConfig;
pub use executor::PipelineExecutor;
