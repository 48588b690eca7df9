//! Prompt construction and output clean-up for spread readings.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use shared::protocol::{CardPayload, SpreadRequest};

pub const READER_PREAMBLE: &str =
    "You are a tarot reader. Be warm, clear, and realistic. Follow the user-provided STRICT RULES exactly.";

pub const FALLBACK_INTERPRETATION: &str =
    "I'm sorry, I couldn't interpret this spread right now.";

static FILLER_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\A\s*(Certainly!|Sure!|Of course!|Absolutely!|Okay!|Alright!)[^\n]*\n+")
        .case_insensitive(true)
        .build()
        .expect("valid filler opener pattern")
});

static TIMELINE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\*\*\s*(Past|Present|Future)\s*—.*?\*\*:?(\s*)")
        .case_insensitive(true)
        .build()
        .expect("valid timeline heading pattern")
});

/// Full model input: the reader preamble followed by the spread prompt.
pub fn model_input(request: &SpreadRequest) -> String {
    format!("{READER_PREAMBLE}\n\n{}", build_prompt(request))
}

pub fn build_prompt(request: &SpreadRequest) -> String {
    match (request.is_daily(), request.cards.first()) {
        (true, Some(card)) => daily_prompt(card),
        _ => spread_prompt(&request.cards),
    }
}

fn daily_prompt(card: &CardPayload) -> String {
    format!(
        "You are a tarot reader. Write an interpretation for a SINGLE CARD daily draw.

STRICT RULES:
- Do NOT use Past/Present/Future.
- Do NOT include greetings or filler like \"Certainly!\", \"Sure!\", \"Of course!\".
- Do NOT mention that you're an AI.
- Output ONLY in this exact structure:

{header}
<1–2 short paragraphs>

**Overall Message:**
<1 short paragraph>

Card meaning reference (use as guidance, do not quote verbatim):
{meaning}",
        header = daily_header(card),
        meaning = card.meaning(),
    )
}

fn spread_prompt(cards: &[CardPayload]) -> String {
    let mut lines = vec![
        "You are a tarot reader. Interpret the following spread.".to_string(),
        String::new(),
        "STRICT RULES:".to_string(),
        "- Do NOT include greetings or filler like \"Certainly!\", \"Sure!\", \"Of course!\"."
            .to_string(),
        "- For EACH card, output exactly one section in this format:".to_string(),
        "  **<Position> — <Card Name> (<Upright/Reversed>):**".to_string(),
        "  <1 paragraph interpretation>".to_string(),
        "- End with:".to_string(),
        "  **Putting It All Together:**".to_string(),
        "  <1 paragraph synthesis>".to_string(),
        String::new(),
        "CARDS:".to_string(),
    ];

    lines.extend(cards.iter().map(|card| {
        format!(
            "- Position: {} | Card: {} | Orientation: {} | MeaningRef: {}",
            card.position,
            card.name,
            card.orientation_label(),
            card.meaning()
        )
    }));

    lines.join("\n")
}

fn daily_header(card: &CardPayload) -> String {
    format!(
        "**Daily Card — {} ({}):**",
        card.name,
        card.orientation_label()
    )
}

/// Strips a cheerful opener, and for daily draws removes timeline headings
/// and makes sure the daily header is present.
pub fn normalize_output(request: &SpreadRequest, text: &str) -> String {
    let mut text = FILLER_OPENER.replace(text, "").trim().to_string();

    if request.is_daily() {
        text = TIMELINE_HEADING.replace_all(&text, "").trim().to_string();

        if !text.contains("**Daily Card") {
            if let Some(card) = request.cards.first() {
                text = format!("{}\n{text}", daily_header(card)).trim().to_string();
            }
        }
    }

    text
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
