//! Dispatch parsing: model completions into routing decisions

use ordo_ai::Message;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::prompts::{DEFAULT_FINAL_MESSAGE, STOP_MARKER};

/// The parsed result of one model completion
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchDecision {
    /// Plain text answer for the user
    Respond(String),
    /// Request to invoke an action with a decoded argument payload
    Invoke {
        action: String,
        arguments: Map<String, Value>,
    },
    /// The conversation is over; carries the remaining text, never empty
    Finish(String),
}

/// Parse a model completion into a dispatch decision.
///
/// Rules, in priority order:
/// 1. a non-assistant message is a fatal parse error, never coerced;
/// 2. text containing the stop marker finishes the conversation with the
///    marker stripped; an empty remainder carries the default final message;
/// 3. a structured action call has its argument payload decoded as an
///    object — a blank payload is an empty map, a malformed one is fatal;
/// 4. anything else is a plain response.
pub fn parse_completion(message: &Message) -> Result<DispatchDecision> {
    let Message::Assistant { text, action_call, .. } = message else {
        return Err(Error::parse(format!(
            "expected an assistant message, got role '{}'",
            message.role()
        )));
    };

    if text.contains(STOP_MARKER) {
        return Ok(DispatchDecision::Finish(strip_stop_marker(text)));
    }

    if let Some(call) = action_call {
        let arguments = decode_arguments(&call.name, &call.arguments)?;
        return Ok(DispatchDecision::Invoke {
            action: call.name.clone(),
            arguments,
        });
    }

    Ok(DispatchDecision::Respond(text.clone()))
}

/// Strip the stop marker from final content, falling back to the default
/// final message so a finish is never empty.
pub fn strip_stop_marker(text: &str) -> String {
    let stripped = text.replace(STOP_MARKER, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        DEFAULT_FINAL_MESSAGE.to_string()
    } else {
        stripped.to_string()
    }
}

fn decode_arguments(action: &str, raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::parse(format!(
            "arguments for '{action}' are not an object: {other}"
        ))),
        Err(e) => Err(Error::parse(format!(
            "malformed arguments for '{action}': {e}"
        ))),
    }
}

/// Forwards streamed text deltas while suppressing the stop marker, even
/// when the marker arrives split across deltas. Holds back any suffix that
/// could still turn out to be the start of the marker.
#[derive(Debug, Default)]
pub struct MarkerFilter {
    held: String,
}

impl MarkerFilter {
    /// Create a new filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a delta, returning the text that is safe to surface now
    pub fn feed(&mut self, delta: &str) -> String {
        self.held.push_str(delta);

        let mut out = String::new();
        loop {
            if let Some(pos) = self.held.find(STOP_MARKER) {
                out.push_str(&self.held[..pos]);
                self.held.drain(..pos + STOP_MARKER.len());
                continue;
            }

            let keep = longest_marker_prefix_suffix(&self.held);
            let safe = self.held.len() - keep;
            out.push_str(&self.held[..safe]);
            self.held.drain(..safe);
            break;
        }
        out
    }

    /// Flush any held text that turned out not to be the marker
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.held)
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of the
/// stop marker.
fn longest_marker_prefix_suffix(text: &str) -> usize {
    let max = STOP_MARKER.len().saturating_sub(1).min(text.len());
    for len in (1..=max).rev() {
        if text.is_char_boundary(text.len() - len)
            && STOP_MARKER.starts_with(&text[text.len() - len..])
        {
            return len;
        }
    }
    0
}
