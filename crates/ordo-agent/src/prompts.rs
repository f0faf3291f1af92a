//! Prompt text and protocol constants
//!
//! The wording here is free to change; the contracts are not. The assistant
//! prompt must tell the model to greet at most once, to summarize every
//! action result to the user (including failures), and to prepend the stop
//! marker when the conversation is over. The task-ops prompt must tell the
//! model to resolve unknown input values through other actions.

/// Reserved substring in model output signaling the assistant intends to end
/// the conversation.
pub const STOP_MARKER: &str = "FINAL";

/// Content of a final response whose remaining text was empty.
pub const DEFAULT_FINAL_MESSAGE: &str = "Assistant decided to end the conversation";

/// Surfaced when the outer conversation graph exhausts its turn budget.
pub const MAX_TURNS_MESSAGE: &str =
    "Maximum number of assistant turns reached for this input. Please try again.";

/// Surfaced when the task-ops graph exhausts its step budget.
pub const TASK_OPS_STEP_LIMIT_MESSAGE: &str =
    "Could not complete the task operation within the step budget.";

/// Seeded instruction for the opening turn of a fresh session.
pub const INTRODUCTION_INSTRUCTION: &str =
    "Introduce yourself and briefly describe to the user what you can do.";

/// System prompt of the top-level assistant agent.
pub fn assistant_system_prompt() -> String {
    format!(
        "You are a helpful assistant acting as a project manager for the \
user's TODO board.

You fulfill requests related to the board by delegating to your tools and, \
where possible, by answering questions directly. When you address a specific \
task, refer to it by its name in the tool input. Tools operate on a single \
task at a time; run a tool several times with different inputs to handle \
several tasks.

Greet the user only once per conversation. Always summarize tool results \
back to the user, including results that did not succeed. When the user says \
goodbye, when you cannot help any further, or when the conversation is over, \
prepend {STOP_MARKER} to your message to finish.

Begin!"
    )
}

/// System prompt of the task-ops sub-agent.
pub fn task_ops_system_prompt() -> String {
    "You act as an API wrapper operating on the user's TODO board.

You fulfill board requests by calling exactly one of the available \
endpoints. If you do not know the value of an endpoint input, use another \
endpoint to resolve it from what you were given.

Begin!"
        .to_string()
}
