//! Candidate filtering for the three query modes.
//!
//! Literal mode uses nucleo-matcher substring atoms (one per whitespace
//! separated term, all of which must match, backslashes taken literally). Regex mode compiles the query
//! with the `regex` crate. Fuzzy mode scores every candidate with a
//! partial-ratio similarity built on `rapidfuzz`.

use std::ops::Range;

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use rapidfuzz::fuzz;
use regex::RegexBuilder;

/// Fuzzy scores must be strictly above this to survive.
pub const FUZZY_THRESHOLD: f64 = 60.0;

/// Maximum number of entries fuzzy mode returns.
pub const FUZZY_LIMIT: usize = 10;

/// How the query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchMode {
    /// Case-insensitive substring match on every whitespace separated term.
    #[default]
    Literal,
    /// Case-insensitive regular expression.
    Regex,
    /// Partial-ratio similarity above a fixed threshold.
    Fuzzy,
}

impl MatchMode {
    /// The mode `Tab` switches to.
    ///
    /// Regex and fuzzy toggle between each other; literal enters that pair
    /// at regex. With fuzzy disabled the toggle is literal <-> regex.
    pub fn toggled(self, fuzzy_enabled: bool) -> Self {
        match (self, fuzzy_enabled) {
            (MatchMode::Literal, _) => MatchMode::Regex,
            (MatchMode::Regex, true) => MatchMode::Fuzzy,
            (MatchMode::Regex, false) => MatchMode::Literal,
            (MatchMode::Fuzzy, _) => MatchMode::Regex,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchMode::Literal => "literal",
            MatchMode::Regex => "regex",
            MatchMode::Fuzzy => "fuzzy",
        }
    }
}

/// One surviving candidate, recomputed on every filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredEntry {
    /// Position of the candidate in the caller's list.
    pub index: usize,
    pub text: String,
    /// Byte ranges of `text` to highlight, sorted and non-overlapping.
    pub highlights: Vec<Range<usize>>,
    /// Similarity in `[0, 100]`, only set in fuzzy mode.
    pub score: Option<f64>,
}

impl FilteredEntry {
    fn plain(index: usize, text: &str) -> Self {
        Self {
            index,
            text: text.to_string(),
            highlights: Vec::new(),
            score: None,
        }
    }
}

/// The query did not compile as a regular expression.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid pattern {pattern:?}: {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Result of a filter pass after the invalid-pattern fallback was applied.
#[derive(Debug, Clone, Default)]
pub struct FilterView {
    pub entries: Vec<FilteredEntry>,
    /// Set when the regex failed to compile and `entries` is the unfiltered list.
    pub invalid: Option<InvalidPattern>,
}

impl FilterView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Filters candidates against a query. Holds a reusable nucleo matcher so
/// its scratch memory survives across keystrokes.
pub struct CandidateMatcher {
    matcher: Matcher,
}

impl Default for CandidateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Filter with the invalid-pattern fallback applied: a regex that does not
    /// compile yields every candidate, unfiltered.
    pub fn filter<S: AsRef<str>>(
        &mut self,
        candidates: &[S],
        query: &str,
        mode: MatchMode,
    ) -> FilterView {
        match self.try_filter(candidates, query, mode) {
            Ok(entries) => FilterView {
                entries,
                invalid: None,
            },
            Err(err) => {
                tracing::warn!(pattern = %err.pattern, error = %err.source, "regex did not compile, showing all options");
                FilterView {
                    entries: unfiltered(candidates),
                    invalid: Some(err),
                }
            }
        }
    }

    /// Filter without the fallback, surfacing `InvalidPattern`.
    pub fn try_filter<S: AsRef<str>>(
        &mut self,
        candidates: &[S],
        query: &str,
        mode: MatchMode,
    ) -> Result<Vec<FilteredEntry>, InvalidPattern> {
        if query.trim().is_empty() {
            return Ok(unfiltered(candidates));
        }
        match mode {
            MatchMode::Literal => Ok(self.literal(candidates, query)),
            MatchMode::Regex => regex_filter(candidates, query),
            MatchMode::Fuzzy => Ok(fuzzy_filter(candidates, query.trim())),
        }
    }

    fn literal<S: AsRef<str>>(&mut self, candidates: &[S], query: &str) -> Vec<FilteredEntry> {
        // Backslashes stay literal: `a\ b` is the two terms `a\` and `b`.
        let atoms: Vec<Atom> = query
            .split_whitespace()
            .map(|term| {
                Atom::new(
                    term,
                    CaseMatching::Ignore,
                    Normalization::Never,
                    AtomKind::Substring,
                    false,
                )
            })
            .collect();
        let matcher = &mut self.matcher;
        let mut haystack_buf = Vec::new();
        let mut indices = Vec::new();

        candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let text = candidate.as_ref();
                indices.clear();
                let haystack = Utf32Str::new(text, &mut haystack_buf);
                for atom in &atoms {
                    atom.indices(haystack, matcher, &mut indices)?;
                }
                indices.sort_unstable();
                indices.dedup();
                Some(FilteredEntry {
                    index,
                    text: text.to_string(),
                    highlights: char_indices_to_ranges(text, &indices),
                    score: None,
                })
            })
            .collect()
    }
}

fn unfiltered<S: AsRef<str>>(candidates: &[S]) -> Vec<FilteredEntry> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, c)| FilteredEntry::plain(index, c.as_ref()))
        .collect()
}

fn regex_filter<S: AsRef<str>>(
    candidates: &[S],
    query: &str,
) -> Result<Vec<FilteredEntry>, InvalidPattern> {
    let regex = RegexBuilder::new(query)
        .case_insensitive(true)
        .build()
        .map_err(|source| InvalidPattern {
            pattern: query.to_string(),
            source,
        })?;

    Ok(candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let text = candidate.as_ref();
            if !regex.is_match(text) {
                return None;
            }
            let highlights = regex
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect();
            Some(FilteredEntry {
                index,
                text: text.to_string(),
                highlights,
                score: None,
            })
        })
        .collect())
}

fn fuzzy_filter<S: AsRef<str>>(candidates: &[S], query: &str) -> Vec<FilteredEntry> {
    let mut scored: Vec<FilteredEntry> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let text = candidate.as_ref();
            let score = partial_ratio(query, text);
            if score <= FUZZY_THRESHOLD {
                return None;
            }
            Some(FilteredEntry {
                index,
                text: text.to_string(),
                highlights: find_ignore_case(text, query).into_iter().collect(),
                score: Some(score),
            })
        })
        .collect();

    // Stable sort keeps the original order among equal scores.
    scored.sort_by(|a, b| {
        let (a, b) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(FUZZY_LIMIT);
    scored
}

/// Best similarity in `[0, 100]` between the shorter string and any
/// equally long window of the longer one. Case-insensitive.
pub fn partial_ratio(query: &str, text: &str) -> f64 {
    let query: Vec<char> = query.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let (short, long) = if query.len() <= text.len() {
        (query, text)
    } else {
        (text, query)
    };
    if short.is_empty() {
        return 0.0;
    }

    let mut best: f64 = 0.0;
    for window in long.windows(short.len()) {
        if window == short.as_slice() {
            return 100.0;
        }
        let ratio = fuzz::ratio(short.iter().copied(), window.iter().copied());
        best = best.max(ratio);
    }
    (best * 100.0).clamp(0.0, 100.0)
}

/// Byte range of the first case-insensitive occurrence of `needle` in `text`.
pub fn find_ignore_case(text: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in text.char_indices() {
        let mut hay = text[start..].char_indices();
        let mut end = start;
        let mut matched = true;
        for n in needle.chars() {
            match hay.next() {
                Some((offset, h)) if h.to_lowercase().eq(n.to_lowercase()) => {
                    end = start + offset + h.len_utf8();
                }
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some(start..end);
        }
    }
    None
}

/// Convert sorted char positions into merged byte ranges.
fn char_indices_to_ranges(text: &str, indices: &[u32]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut wanted = indices.iter().map(|&i| i as usize).peekable();

    for (char_pos, (byte_pos, ch)) in text.char_indices().enumerate() {
        match wanted.peek() {
            Some(&next) if next == char_pos => {
                wanted.next();
                let end = byte_pos + ch.len_utf8();
                match ranges.last_mut() {
                    Some(last) if last.end == byte_pos => last.end = end,
                    _ => ranges.push(byte_pos..end),
                }
            }
            Some(_) => {}
            None => break,
        }
    }
    ranges
}
