//! Idea → script → audio → video orchestration.
//!
//! - [`machine`]: the explicit step enum, context, events, and the pure
//!   transition function.
//! - [`orchestrator`]: the actor that owns the current state.
//! - [`poller`]: forwards a video job's stream into the orchestrator.
//! - [`session`]: runs jobs on behalf of the pipeline.
//! - [`view`]: flags derived from a snapshot.

pub mod machine;
pub mod orchestrator;
pub mod poller;
pub mod session;
pub mod view;

pub use machine::{transition, Disposition, PipelineContext, PipelineEvent, PipelineStep};
pub use orchestrator::{Orchestrator, OrchestratorClosed, OrchestratorHandle, PipelineSnapshot};
pub use session::{PipelineSession, SessionError};
pub use view::PipelineView;
