//! Post-processing: deterministic cleanup of the model's sentence.
//!
//! Even when told to answer in one sentence, models sometimes wrap the answer
//! in quotes or a code fence, or break it across lines. These rules undo that
//! without touching the words themselves. Off by default; enabled through
//! `DescribeConfig::clean_output`.
//!
//! ## Rule Order
//!
//! Fences are stripped before quotes (a fenced answer may itself be quoted),
//! and whitespace is collapsed last so it also covers what the first two
//! rules expose.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw model output.
///
/// 1. Strip an outer code fence
/// 2. Strip one pair of wrapping quotes
/// 3. Collapse whitespace runs (including newlines) to single spaces
pub fn clean_description(input: &str) -> String {
    let s = strip_code_fence(input.trim());
    let s = strip_wrapping_quotes(s.trim());
    collapse_whitespace(s.trim())
}

// ── Rule 1: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").unwrap());

fn strip_code_fence(input: &str) -> &str {
    match RE_OUTER_FENCE.captures(input) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(input),
        None => input,
    }
}

// ── Rule 2: Strip wrapping quotes ────────────────────────────────────────────

const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”'), ('`', '`')];

fn strip_wrapping_quotes(input: &str) -> &str {
    for &(open, close) in QUOTE_PAIRS {
        if let Some(inner) = input
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            // Leave `"Hi," she said, "bye"` alone: the inside must be quote-free.
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    input
}

// ── Rule 3: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}
