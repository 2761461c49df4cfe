//! Boundary adjuster: grow or shrink a candidate range over the full text.
//!
//! Every function here is pure: it takes the full text and a `[start, end)` character range and
//! returns a new range. Inputs and results pass through
//! [`normalize_offsets`](crate::offsets::normalize_offsets), so results never start or end on
//! whitespace and word-level moves are monotonic relative to the normalized input.
//!
//! An adjustment that returns its input unchanged means "nothing further in that direction";
//! [`adjust`] reports that as [`AdjustOutcome::Unchanged`] so hosts can tell the user they hit
//! the start/end of the text instead of treating it as a failure.

use crate::offsets::{OffsetRange, normalize_chars, normalize_offsets};
use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// A named boundary adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adjustment {
    /// Grow the start by one word.
    ExpandStart,
    /// Grow the end by one word.
    ExpandEnd,
    /// Drop the first word.
    ShrinkStart,
    /// Drop the last word.
    ShrinkEnd,
    /// Grow to the enclosing sentence(s).
    Sentence,
    /// Grow to the enclosing paragraph(s).
    Paragraph,
}

/// Result of [`adjust`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// The range moved.
    Changed(OffsetRange),
    /// No further adjustment possible in that direction; the range is returned as-is.
    Unchanged(OffsetRange),
}

impl AdjustOutcome {
    /// The resulting range, changed or not.
    pub fn range(&self) -> OffsetRange {
        match self {
            Self::Changed(range) | Self::Unchanged(range) => *range,
        }
    }

    /// Returns `true` if the range moved.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Apply `adjustment` to `[start, end)` and report whether anything changed.
///
/// The comparison is against the normalized input, so trimming alone is not a change.
pub fn adjust(full_text: &str, start: usize, end: usize, adjustment: Adjustment) -> AdjustOutcome {
    let result = match adjustment {
        Adjustment::ExpandStart => expand_start(full_text, start, end),
        Adjustment::ExpandEnd => expand_end(full_text, start, end),
        Adjustment::ShrinkStart => shrink_start(full_text, start, end),
        Adjustment::ShrinkEnd => shrink_end(full_text, start, end),
        Adjustment::Sentence => expand_to_sentence(full_text, start, end),
        Adjustment::Paragraph => expand_to_paragraph(full_text, start, end),
    };
    if result == normalize_offsets(full_text, start, end) {
        AdjustOutcome::Unchanged(result)
    } else {
        AdjustOutcome::Changed(result)
    }
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn clamp(chars: &[char], start: usize, end: usize) -> (usize, usize) {
    let end = end.min(chars.len());
    (start.min(end), end)
}

/// Move `start` back by one word: skip adjacent whitespace, then the word before it.
pub fn expand_start(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let OffsetRange { mut start, end } = normalize_chars(&chars, start, end);
    if start == 0 {
        return OffsetRange::new(start, end);
    }
    while start > 0 && chars[start - 1].is_whitespace() {
        start -= 1;
    }
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    normalize_chars(&chars, start, end)
}

/// Move `end` forward by one word: skip adjacent whitespace, then the word after it.
pub fn expand_end(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let OffsetRange { start, mut end } = normalize_chars(&chars, start, end);
    if end == chars.len() {
        return OffsetRange::new(start, end);
    }
    while end < chars.len() && chars[end].is_whitespace() {
        end += 1;
    }
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    normalize_chars(&chars, start, end)
}

fn leading_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\S+\s*").expect("invalid leading token regex"))
}

fn trailing_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\S+\s*$").expect("invalid trailing token regex"))
}

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\n[^\S\n]*(?:\n[^\S\n]*)+").expect("invalid paragraph break regex")
    })
}

/// Drop the first whitespace-delimited token of the span. No-op for a single token.
pub fn shrink_start(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let OffsetRange { start, end } = normalize_chars(&chars, start, end);
    let span: String = chars[start..end].iter().collect();
    let Some(m) = leading_token().find(&span) else {
        return OffsetRange::new(start, end);
    };
    if m.end() >= span.len() {
        return OffsetRange::new(start, end);
    }
    let removed = span[..m.end()].chars().count();
    normalize_chars(&chars, start + removed, end)
}

/// Drop the last whitespace-delimited token of the span. No-op for a single token.
pub fn shrink_end(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let OffsetRange { start, end } = normalize_chars(&chars, start, end);
    let span: String = chars[start..end].iter().collect();
    let Some(m) = trailing_token().find(&span) else {
        return OffsetRange::new(start, end);
    };
    if m.start() == 0 {
        return OffsetRange::new(start, end);
    }
    let kept = span[..m.start()].chars().count();
    normalize_chars(&chars, start, start + kept)
}

/// Grow `[start, end)` to the enclosing sentence(s).
///
/// The start walks back to just after a terminator (`.`, `!`, `?`) or newline; the end walks
/// forward up to and including the next terminator, or up to a newline.
pub fn expand_to_sentence(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let (start, end) = clamp(&chars, start, end);

    let mut new_start = start;
    while new_start > 0 && !is_terminator(chars[new_start - 1]) && chars[new_start - 1] != '\n' {
        new_start -= 1;
    }
    while new_start < start && chars[new_start].is_whitespace() {
        new_start += 1;
    }

    let mut new_end = end;
    while new_end < chars.len() && !is_terminator(chars[new_end]) && chars[new_end] != '\n' {
        new_end += 1;
    }
    if new_end < chars.len() && is_terminator(chars[new_end]) {
        new_end += 1;
    }
    while new_end < chars.len() && chars[new_end].is_whitespace() && chars[new_end] != '\n' {
        new_end += 1;
    }

    finish(&chars, new_start, new_end)
}

/// Grow `[start, end)` to the enclosing paragraph(s).
///
/// Paragraphs are separated by blank lines: two or more newlines, possibly with other
/// whitespace between them.
pub fn expand_to_paragraph(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    let (start, end) = clamp(&chars, start, end);

    let mut para_start = 0usize;
    let mut para_end = chars.len();
    let mut byte_cursor = 0usize;
    let mut char_cursor = 0usize;
    let mut to_char = |byte: usize| {
        char_cursor += full_text[byte_cursor..byte].chars().count();
        byte_cursor = byte;
        char_cursor
    };

    for m in paragraph_break().find_iter(full_text) {
        let delim_start = to_char(m.start());
        let delim_end = to_char(m.end());
        if delim_end <= start {
            para_start = delim_end;
        }
        if delim_start >= end {
            para_end = delim_start;
            break;
        }
    }

    finish(&chars, para_start, para_end)
}

fn finish(chars: &[char], start: usize, end: usize) -> OffsetRange {
    let trimmed = normalize_chars(chars, start, end);
    if trimmed.end <= trimmed.start {
        let start = trimmed.start.min(chars.len().saturating_sub(1));
        return normalize_chars(chars, start, (start + 1).min(chars.len()));
    }
    trimmed
}

/// The Unicode word containing `offset` (word boundaries per UAX #29).
///
/// Returns `None` when `offset` is past the end or sits on whitespace/punctuation.
pub fn word_at(full_text: &str, offset: usize) -> Option<OffsetRange> {
    let mut char_pos = 0usize;
    for word in full_text.split_word_bounds() {
        let len = word.chars().count();
        if offset < char_pos + len {
            let is_word = word.chars().any(char::is_alphanumeric);
            return is_word.then(|| OffsetRange::new(char_pos, char_pos + len));
        }
        char_pos += len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The quick brown fox. Jumps high.";

    fn r(start: usize, end: usize) -> OffsetRange {
        OffsetRange::new(start, end)
    }

    #[test]
    fn test_expand_start_and_end() {
        // "brown"
        assert_eq!(expand_start(TEXT, 10, 15), r(4, 15));
        assert_eq!(expand_start(TEXT, 4, 15), r(0, 15));
        assert_eq!(expand_start(TEXT, 0, 15), r(0, 15));

        assert_eq!(expand_end(TEXT, 10, 15), r(10, 20));
        assert_eq!(expand_end(TEXT, 10, 20), r(10, 26));
        assert_eq!(expand_end(TEXT, 10, 32), r(10, 32));
    }

    #[test]
    fn test_expand_from_mid_word_snaps_to_word_edge() {
        assert_eq!(expand_start(TEXT, 6, 9), r(4, 9));
        assert_eq!(expand_end(TEXT, 4, 7), r(4, 9));
    }

    #[test]
    fn test_shrink_start_and_end() {
        assert_eq!(shrink_start(TEXT, 4, 19), r(10, 19));
        assert_eq!(shrink_end(TEXT, 4, 19), r(4, 15));
        // Single word: nothing to drop.
        assert_eq!(shrink_start(TEXT, 4, 9), r(4, 9));
        assert_eq!(shrink_end(TEXT, 4, 9), r(4, 9));
    }

    #[test]
    fn test_shrink_converges() {
        let mut range = r(0, 32);
        for _ in 0..10 {
            range = shrink_start(TEXT, range.start, range.end);
        }
        assert_eq!(range, r(27, 32));
        assert_eq!(shrink_start(TEXT, range.start, range.end), range);
    }

    #[test]
    fn test_expand_to_sentence() {
        assert_eq!(expand_to_sentence(TEXT, 4, 9), r(0, 20));
        assert_eq!(expand_to_sentence(TEXT, 23, 25), r(21, 32));
        assert_eq!(expand_to_sentence(TEXT, 4, 23), r(0, 32));
    }

    #[test]
    fn test_expand_to_sentence_stops_at_newline() {
        let text = "Heading\nBody text here";
        assert_eq!(expand_to_sentence(text, 9, 12), r(8, 22));
        assert_eq!(expand_to_sentence(text, 1, 3), r(0, 7));
    }

    #[test]
    fn test_expand_to_paragraph() {
        let text = "First para.\n\nSecond para line one.\nline two.\n \n\nThird.";
        let second = text.find("Second").unwrap();
        let end_second = text.find("two.").unwrap() + 4;
        assert_eq!(
            expand_to_paragraph(text, second + 2, second + 5),
            r(second, end_second)
        );
        assert_eq!(expand_to_paragraph(text, 0, 3), r(0, 11));
        let third = text.find("Third").unwrap();
        assert_eq!(expand_to_paragraph(text, third + 1, third + 2), r(third, text.len()));
    }

    #[test]
    fn test_degenerate_clamps_to_one_char() {
        // A selection sitting on whitespace-only paragraph content collapses; clamp keeps
        // a non-empty range.
        let text = "a.  ";
        let range = expand_to_sentence(text, 2, 3);
        assert!(range.start <= range.end);
    }

    #[test]
    fn test_adjust_reports_unchanged() {
        assert_eq!(
            adjust(TEXT, 0, 5, Adjustment::ExpandStart),
            AdjustOutcome::Unchanged(r(0, 5))
        );
        let outcome = adjust(TEXT, 4, 9, Adjustment::Sentence);
        assert!(outcome.is_changed());
        assert_eq!(outcome.range(), r(0, 20));
    }

    #[test]
    fn test_input_is_normalized_first() {
        assert_eq!(expand_start("  x", 1, 3), r(2, 3));
        assert_eq!(adjust("  x", 1, 3, Adjustment::ExpandStart), AdjustOutcome::Unchanged(r(2, 3)));
        assert_eq!(expand_end("x  ", 0, 2), r(0, 1));
        assert_eq!(shrink_start(TEXT, 3, 10), r(4, 9));
        assert_eq!(shrink_end(TEXT, 3, 16), r(4, 9));
        assert_eq!(adjust(TEXT, 3, 10, Adjustment::ShrinkStart), AdjustOutcome::Unchanged(r(4, 9)));
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at(TEXT, 6), Some(r(4, 9)));
        assert_eq!(word_at(TEXT, 3), None);
        assert_eq!(word_at(TEXT, 99), None);
        assert_eq!(word_at("naïve café", 8), Some(r(6, 10)));
    }
}
