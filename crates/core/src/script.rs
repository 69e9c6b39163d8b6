//! Script metrics and prompt construction for narration scripts.

// ---------------------------------------------------------------------------
// Narration pace
// ---------------------------------------------------------------------------

/// Narration pace used to estimate spoken duration. Part of the job result
/// contract, not a tuning knob.
pub const WORDS_PER_MINUTE: f64 = 160.0;

/// Upper bound on generated script length communicated to the text backend.
pub const MAX_SCRIPT_WORDS: usize = 150;

/// Count whitespace-separated words.
pub fn word_count(script: &str) -> usize {
    script.split_whitespace().count()
}

/// Estimated narration length in whole seconds, never below one second.
///
/// `round(word_count / 160 * 60)`.
pub fn estimated_duration_secs(word_count: usize) -> u32 {
    let secs = (word_count as f64 / WORDS_PER_MINUTE * 60.0).round() as u32;
    secs.max(1)
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// How the text backend should treat the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Draft a new script from an idea.
    IdeaToScript,
    /// Polish an existing script.
    RefineExisting,
}

/// System prompt shared by both modes.
pub fn system_prompt() -> String {
    let limit = format!("Keep the entire script under {MAX_SCRIPT_WORDS} words.");
    let parts: [&str; 5] = [
        "You are an expert video scriptwriter for an AI avatar studio.",
        "Write engaging, cinematic narratives directly in plain text paragraphs (no markdown, bullet points, or numbering).",
        "Every paragraph should be 3-4 sentences and flow naturally for voiceover delivery.",
        "Always return the full script ready to read aloud and end with a motivating closing paragraph.",
        &limit,
    ];
    parts.join(" ")
}

/// User prompt for the given mode.
pub fn user_prompt(
    mode: ScriptMode,
    idea: Option<&str>,
    script: Option<&str>,
    instructions: Option<&str>,
) -> String {
    let lines: Vec<String> = match mode {
        ScriptMode::IdeaToScript => [
            Some(format!("Video idea: {}", idea.unwrap_or("N/A"))),
            instructions.map(|i| format!("Style instructions: {i}")),
            Some("Draft the complete script as continuous paragraphs without headings or lists.".into()),
            Some(format!("Ensure the script stays under {MAX_SCRIPT_WORDS} words.")),
        ]
        .into_iter()
        .flatten()
        .collect(),
        ScriptMode::RefineExisting => vec![
            "Revise the following script to improve clarity, storytelling, and emotional impact while keeping the core ideas:".into(),
            script.unwrap_or_default().to_string(),
            match instructions {
                Some(i) => format!(
                    "Additional guidance: {i}. Maintain paragraph format, no bullet points or markdown."
                ),
                None => "Maintain paragraph format, no bullet points or markdown.".into(),
            },
            format!("Keep the entire script under {MAX_SCRIPT_WORDS} words."),
        ],
    };
    lines.join("\n")
}

/// Canned script used when no text backend is available.
pub fn template_script(idea: Option<&str>) -> String {
    let topic = idea.filter(|i| !i.trim().is_empty());
    let quoted = topic.unwrap_or("this amazing topic");
    let subject = topic.unwrap_or("This topic");
    let short = topic.unwrap_or("this");
    let world = topic.unwrap_or("innovation");

    format!(
        "Welcome to our presentation about \"{quoted}\".\n\n\
In today's video, we'll explore the fundamental concepts and practical applications of this topic.\n\n\
First, let's understand what makes this subject so important in our current context. {subject} represents a significant advancement in its field, offering unique solutions to contemporary challenges.\n\n\
Throughout this presentation, we'll cover:\n\
- The core principles and foundations\n\
- Real-world applications and benefits\n\
- Future implications and opportunities\n\n\
By the end of this video, you'll have a comprehensive understanding of how {short} can transform your perspective and approach.\n\n\
Let's dive in and discover the fascinating world of {world} together.\n\n\
Thank you for joining us on this educational journey."
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
