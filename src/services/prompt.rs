//! Prompt construction for window content generation.
//!
//! The model sees a system prompt, a one-line summary of the current
//! interaction, the app context, a numbered list of earlier interactions,
//! and the full JSON of the current interaction. Values are clipped so a
//! pasted document cannot crowd out the instructions.

use std::fmt::Write;

use super::desktop::app_display_name;
use super::interaction::Interaction;

const CURRENT_VALUE_CLIP: usize = 100;
const PAST_VALUE_CLIP: usize = 50;

/// System prompt, parameterized by how much history accompanies it.
#[must_use]
pub fn system_prompt(max_history_length: usize) -> String {
    format!(
        "You are the operating system of a web desktop. Every time the user \
clicks, types, or speaks, you render the content area of the active app \
window as HTML.\n\
\n\
Rules:\n\
- Output HTML for the window body only: no <html>, <head>, <body>, markdown \
fences, or commentary.\n\
- Use classes llm-container, llm-title, llm-text, llm-button and llm-input \
for consistent styling. Inline styles are allowed for layout.\n\
- Every clickable element must carry a data-interaction-id attribute with a \
unique, descriptive id. Inputs that belong to a form carry an id; the submit \
button lists them in data-value-from.\n\
- Do not emit <script> tags or external resources.\n\
- Keep the user oriented: the content must follow from the current \
interaction and the app it happened in.\n\
\n\
You receive the current interaction plus up to {} earlier interactions \
(newest first) for continuity. Use them to keep state consistent, for \
example the text in a notepad or the page in a browser.",
        max_history_length.saturating_sub(1)
    )
}

/// Build the user prompt. `history` is newest-first and non-empty.
#[must_use]
pub fn build_prompt(history: &[Interaction], effective_len: usize) -> String {
    let Some((current, past)) = history.split_first() else {
        return String::new();
    };
    let data = &current.data;

    let element_name = label_for(&data.element_text, &data.id);
    let mut summary = format!(
        "Current User Interaction: Clicked on '{element_name}' (Type: {}, ID: {}).",
        or_na(&data.kind),
        or_na(&data.id)
    );
    if let Some(value) = data.value.as_deref().filter(|v| !v.is_empty()) {
        let _ = write!(summary, " Associated value: '{}'.", clip(value, CURRENT_VALUE_CLIP));
    }

    let app_context = match data.app_context.as_deref() {
        Some(app) => format!("Current App Context: '{}'.", app_display_name(app)),
        None => "No specific app context for current interaction.".to_string(),
    };

    let mut past_segment = String::new();
    if !past.is_empty() {
        let _ = write!(
            past_segment,
            "\n\nPrevious User Interactions (up to {} most recent, newest first, all before the current one):",
            effective_len.saturating_sub(1)
        );
        for (index, interaction) in past.iter().enumerate() {
            let p = &interaction.data;
            let app_name = p.app_context.as_deref().map_or("N/A", app_display_name);
            let _ = write!(
                past_segment,
                "\n{}. (App: {app_name}) Clicked '{}' (Type: {}, ID: {})",
                index + 1,
                label_for(&p.element_text, &p.id),
                or_na(&p.kind),
                or_na(&p.id)
            );
            if let Some(value) = p.value.as_deref().filter(|v| !v.is_empty()) {
                let _ = write!(past_segment, " with value '{}'", clip(value, PAST_VALUE_CLIP));
            }
            past_segment.push('.');
        }
    }

    let full_json = serde_json::to_string_pretty(data).unwrap_or_default();

    format!(
        "{summary}\n{app_context}\n{past_segment}\n\n\
Full Context for Current Interaction (for your reference, primarily use summaries and history):\n\
{full_json}\n\n\
Generate the HTML content for the window's content area only:"
    )
}

fn label_for<'a>(element_text: &'a str, id: &'a str) -> &'a str {
    if !element_text.is_empty() {
        element_text
    } else if !id.is_empty() {
        id
    } else {
        "Unknown Element"
    }
}

fn or_na(s: &str) -> &str {
    if s.is_empty() { "N/A" } else { s }
}

/// First `max` characters, never splitting a code point.
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
