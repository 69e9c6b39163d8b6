use avstudio_backends::GenerationBackend;
use avstudio_core::job::JobType;
use avstudio_core::payload::{Fallback, ScriptInput, ScriptResult};
use avstudio_core::script::{
    estimated_duration_secs, system_prompt, template_script, user_prompt, word_count, ScriptMode,
};

use super::{fallback_for, non_blank, parse_input, to_result, Failure};
use crate::config::ExecutorConfig;
use crate::schedule::{pause, Reporter, DEFAULT_STEPS};

/// Write a script from an idea, or polish a supplied draft.
pub(crate) async fn run(
    backend: &dyn GenerationBackend,
    config: &ExecutorConfig,
    reporter: &Reporter<'_>,
    input: &serde_json::Value,
) -> Result<serde_json::Value, Failure> {
    let input: ScriptInput = parse_input(input)?;
    let idea = non_blank(input.idea);
    let draft = non_blank(input.script);
    let instructions = non_blank(input.instructions);
    if idea.is_none() && draft.is_none() {
        return Err(Failure::new(
            "Either idea or script content must be provided",
        ));
    }

    let delay = config.step_delay(JobType::Script);
    reporter.start();

    let mode = if draft.is_some() {
        ScriptMode::RefineExisting
    } else {
        ScriptMode::IdeaToScript
    };
    let system = system_prompt();
    let user = user_prompt(
        mode,
        idea.as_deref(),
        draft.as_deref(),
        instructions.as_deref(),
    );

    let (generated, ()) = tokio::join!(
        backend.generate_text(&system, &user),
        reporter.walk(&DEFAULT_STEPS, delay),
    );
    pause(delay).await;

    let (script, fallback) = match generated {
        Ok(text) => (text, Fallback::none()),
        Err(e) => {
            let fallback = fallback_for(reporter.job_id(), JobType::Script, &e);
            let script = match &draft {
                Some(draft) => draft.trim().to_string(),
                None => template_script(idea.as_deref()),
            };
            (script, fallback)
        }
    };

    let words = word_count(&script);
    to_result(&ScriptResult {
        word_count: words,
        estimated_duration: estimated_duration_secs(words),
        script,
        idea,
        instructions,
        updated_at: chrono::Utc::now(),
        fallback,
    })
}
