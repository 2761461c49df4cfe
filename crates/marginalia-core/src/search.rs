//! In-document search.
//!
//! Queries are always literal text: the query is escaped and compiled into a regex, optionally
//! wrapped in word boundaries. Hits are half-open ranges in **character offsets** over the full
//! text, the same coordinate space highlights use.

use crate::text::CharIndex;
use regex::{Regex, RegexBuilder};

/// Options that control how search is performed.
///
/// The default is a case-insensitive substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words.
    pub whole_word: bool,
}

/// A search hit, expressed as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl SearchHit {
    /// Returns the length of the hit in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the hit is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Navigation direction through the hit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the end of the document.
    Next,
    /// Towards the start of the document.
    Prev,
}

/// Compile `query` into a matcher.
///
/// Returns `None` when the query is shorter than `min_chars` characters or the pattern fails
/// to build; callers treat that as "no hits".
pub fn compile(query: &str, options: SearchOptions, min_chars: usize) -> Option<Regex> {
    if query.is_empty() || query.chars().count() < min_chars {
        return None;
    }

    let escaped = regex::escape(query);
    let pattern = if options.whole_word {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };

    match RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(%err, "search pattern failed to compile");
            None
        }
    }
}

/// Every non-overlapping match of `re` in `text`, left to right.
///
/// Zero-length matches are dropped and the scan advances one character past them.
pub fn find_all(text: &str, re: &Regex) -> Vec<SearchHit> {
    let index = CharIndex::new(text);
    let mut hits = Vec::new();
    let mut start_char = 0usize;

    while start_char <= index.char_count() {
        let start_byte = index.char_to_byte(start_char);
        let Some(m) = re.find_at(text, start_byte) else {
            break;
        };

        let hit = SearchHit {
            start: index.byte_to_char(m.start()),
            end: index.byte_to_char(m.end()),
        };

        if hit.is_empty() {
            start_char = hit.end + 1;
            continue;
        }

        start_char = hit.end;
        hits.push(hit);
    }

    hits
}

/// Compile `query` and collect its hits in `text`.
pub fn search(text: &str, query: &str, options: SearchOptions, min_chars: usize) -> Vec<SearchHit> {
    compile(query, options, min_chars)
        .map(|re| find_all(text, &re))
        .unwrap_or_default()
}

/// Step through a hit list of `len` entries with wraparound.
///
/// With no current hit, `Next` lands on the first and `Prev` on the last. Returns `None` when
/// the list is empty.
pub fn navigate(len: usize, current: Option<usize>, direction: Direction) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match (current, direction) {
        (None, Direction::Next) => 0,
        (None, Direction::Prev) => len - 1,
        (Some(cur), Direction::Next) => {
            if cur + 1 >= len {
                0
            } else {
                cur + 1
            }
        }
        (Some(cur), Direction::Prev) => {
            if cur == 0 || cur > len {
                len - 1
            } else {
                cur - 1
            }
        }
    };
    Some(next)
}

/// Query, options and the derived hit list.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    options: SearchOptions,
    hits: Vec<SearchHit>,
    current: Option<usize>,
}

impl SearchState {
    /// Create an empty search state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the query and options. Call [`recompute`](Self::recompute) afterwards.
    pub fn set_query(&mut self, query: impl Into<String>, options: SearchOptions) {
        self.query = query.into();
        self.options = options;
    }

    /// Re-run the query over `text`, resetting the current hit to the first one.
    pub fn recompute(&mut self, text: &str, min_chars: usize) {
        self.hits = search(text, &self.query, self.options, min_chars);
        self.current = if self.hits.is_empty() { None } else { Some(0) };
    }

    /// Advance to the next hit (wrapping).
    pub fn next_hit(&mut self) -> Option<SearchHit> {
        self.step(Direction::Next)
    }

    /// Go back to the previous hit (wrapping).
    pub fn prev_hit(&mut self) -> Option<SearchHit> {
        self.step(Direction::Prev)
    }

    fn step(&mut self, direction: Direction) -> Option<SearchHit> {
        self.current = navigate(self.hits.len(), self.current, direction);
        self.current_hit()
    }

    /// Drop the query and all hits.
    pub fn clear(&mut self) {
        self.query.clear();
        self.hits.clear();
        self.current = None;
    }

    /// The active query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The active options.
    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// All hits, in document order.
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    /// Index of the current hit.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// The current hit.
    pub fn current_hit(&self) -> Option<SearchHit> {
        self.current.and_then(|i| self.hits.get(i).copied())
    }

    /// `(current, total)` for a "3 of 7" style counter; `(0, 0)` without hits.
    pub fn counter(&self) -> (usize, usize) {
        match self.current {
            Some(i) if !self.hits.is_empty() => (i + 1, self.hits.len()),
            _ => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(hits: &[SearchHit]) -> Vec<(usize, usize)> {
        hits.iter().map(|h| (h.start, h.end)).collect()
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let text = "the cat. The catalog.";
        let hits = search(text, "the", SearchOptions::default(), 2);
        assert_eq!(spans(&hits), vec![(0, 3), (9, 12)]);

        let sensitive = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };
        assert_eq!(spans(&search(text, "The", sensitive, 2)), vec![(9, 12)]);
    }

    #[test]
    fn test_whole_word() {
        let text = "cat catalog cat";
        let options = SearchOptions {
            whole_word: true,
            ..Default::default()
        };
        assert_eq!(spans(&search(text, "cat", options, 2)), vec![(0, 3), (12, 15)]);
        assert_eq!(search(text, "cat", SearchOptions::default(), 2).len(), 3);
    }

    #[test]
    fn test_short_query_yields_nothing() {
        assert!(compile("a", SearchOptions::default(), 2).is_none());
        assert!(compile("", SearchOptions::default(), 0).is_none());
        assert!(search("aaa", "a", SearchOptions::default(), 2).is_empty());
        assert_eq!(search("aaa", "a", SearchOptions::default(), 1).len(), 3);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let text = "a.b axb (a.b)";
        assert_eq!(spans(&search(text, "a.b", SearchOptions::default(), 2)), vec![(0, 3), (9, 12)]);
        assert_eq!(search(text, "(a", SearchOptions::default(), 2).len(), 1);
    }

    #[test]
    fn test_character_offsets() {
        let text = "日本語 text 日本語";
        assert_eq!(spans(&search(text, "日本", SearchOptions::default(), 2)), vec![(0, 2), (9, 11)]);
    }

    #[test]
    fn test_zero_length_matches_advance() {
        let re = Regex::new("x*").unwrap();
        assert_eq!(spans(&find_all("abxxc", &re)), vec![(2, 4)]);
    }

    #[test]
    fn test_navigate_wraps() {
        assert_eq!(navigate(3, Some(2), Direction::Next), Some(0));
        assert_eq!(navigate(3, Some(0), Direction::Prev), Some(2));
        assert_eq!(navigate(3, Some(1), Direction::Next), Some(2));
        assert_eq!(navigate(3, None, Direction::Prev), Some(2));
        assert_eq!(navigate(0, Some(0), Direction::Next), None);
        assert_eq!(navigate(0, None, Direction::Prev), None);
    }

    #[test]
    fn test_state_cycles_back_to_start() {
        let text = "the cat. The catalog. Then.";
        let mut state = SearchState::new();
        state.set_query("the", SearchOptions::default());
        state.recompute(text, 2);
        assert_eq!(state.hits().len(), 3);
        assert_eq!(state.current(), Some(0));
        assert_eq!(state.counter(), (1, 3));

        for _ in 0..3 {
            state.next_hit();
        }
        assert_eq!(state.current(), Some(0));
        assert_eq!(state.prev_hit().map(|h| h.start), Some(22));

        state.clear();
        assert_eq!(state.counter(), (0, 0));
        assert!(state.next_hit().is_none());
    }
}
