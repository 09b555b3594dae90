//! Judge prompt rendering
//!
//! The prompt is a pure function of the document text and the rule list:
//! identical inputs always render byte-identical prompts.

/// Maximum number of document characters forwarded to the judge.
///
/// The cut is a raw prefix with no marker, so evidence near the end of a long
/// document can be lost.
pub const MAX_DOCUMENT_CHARS: usize = 15_000;

/// Keep at most `max_chars` characters of `text`
pub fn truncate_to(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Keep at most [`MAX_DOCUMENT_CHARS`] characters of `text`
pub fn truncate_text(text: &str) -> &str {
    truncate_to(text, MAX_DOCUMENT_CHARS)
}

/// Render the judge prompt for `rules` against the document `text`.
///
/// The text is truncated to [`MAX_DOCUMENT_CHARS`] first. The model is asked
/// for exactly one JSON object per rule.
pub fn build_prompt<S: AsRef<str>>(text: &str, rules: &[S]) -> String {
    let document_text = truncate_text(text);

    let rule_list = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");

    let count = rules.len();
    let noun = if count == 1 { "object" } else { "objects" };

    format!(
        r#"
You are checking a PDF document against user-defined rules.

Document text (may be truncated):
"""
{document_text}
"""

User rules:
{rule_list}

For each rule, you must:
- Decide if the rule PASSES or FAILS.
- Find exactly ONE clear evidence sentence from the document.
- If possible, include a page number in the evidence like: "Found on page 2: '<quote>'".
- Provide a short reasoning (1-2 sentences) explaining why it passed or failed.
- Assign a numeric confidence score between 0 and 100 (no % symbol).

Return ONLY a JSON array of {count} {noun}, in the same order as the rules, in this exact format:
[
  {{
    "rule": "original rule text",
    "status": "pass" or "fail",
    "evidence": "one concise evidence sentence, ideally with page number like 'Found on page 2: ...'",
    "reasoning": "short reasoning (1-2 sentences).",
    "confidence": 0-100
  }}
]

Do not include any extra keys, comments, or text outside the JSON array.
"#
    )
}
