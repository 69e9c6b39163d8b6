//! Milestone phrases attached to `status` stream events.

use avstudio_core::job::{JobStatus, JobType};

pub const QUEUED_MESSAGE: &str = "Job queued for processing...";
pub const COMPLETED_MESSAGE: &str = "Job completed successfully!";
pub const FAILED_MESSAGE: &str = "Job failed. Please try again.";

const SCRIPT_PHASES: [&str; 5] = [
    "Analyzing your idea...",
    "Generating script structure...",
    "Crafting the narrative...",
    "Refining the script...",
    "Finalizing the content...",
];

const AUDIO_PHASES: [&str; 5] = [
    "Preparing text for synthesis...",
    "Initializing voice model...",
    "Generating speech...",
    "Processing audio...",
    "Finalizing audio file...",
];

const VIDEO_PHASES: [&str; 5] = [
    "Loading avatar model...",
    "Processing audio input...",
    "Generating lip sync...",
    "Rendering animation...",
    "Finalizing video...",
];

fn phases(job_type: JobType) -> &'static [&'static str] {
    match job_type {
        JobType::Script => &SCRIPT_PHASES,
        JobType::Audio => &AUDIO_PHASES,
        JobType::Video => &VIDEO_PHASES,
    }
}

/// Phrase describing a job at `progress` percent in `status`.
///
/// While processing, the phrase is picked from the per-type table at
/// `min(floor(progress / 100 * n), n - 1)`.
pub fn progress_message(status: JobStatus, progress: u8, job_type: JobType) -> &'static str {
    match status {
        JobStatus::Queued => QUEUED_MESSAGE,
        JobStatus::Completed => COMPLETED_MESSAGE,
        JobStatus::Failed => FAILED_MESSAGE,
        JobStatus::Processing => {
            let table = phases(job_type);
            let index = (usize::from(progress) * table.len()) / 100;
            table[index.min(table.len() - 1)]
        }
    }
}
