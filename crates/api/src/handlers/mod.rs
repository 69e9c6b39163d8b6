pub mod generation;
pub mod jobs;
pub mod pipeline;
