//! Keyword occurrence scanning and bounded-context snippets.
//!
//! Matching is case-insensitive. Both the text and the keyword are folded
//! one character at a time, so character positions in the folded copy line
//! up with the original and the returned snippets keep their casing.
//! Window sizes and positions count characters, not bytes.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    spans::ClaimedSpans,
};

/// Marker added where a snippet cuts into the surrounding text.
pub const ELLIPSIS: &str = "...";

/// Context characters on each side for titles, pages and annotations.
pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// Context before a hit in raw page text.
pub const DEFAULT_RAW_BEFORE: usize = 5;

/// Context after a hit in raw page text.
pub const DEFAULT_RAW_AFTER: usize = 20;

/// How much text to keep around a keyword hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetWindow {
    pub before: usize,
    pub after: usize,
}

impl SnippetWindow {
    pub const STRUCTURED: Self =
        Self::new(DEFAULT_CONTEXT_CHARS, DEFAULT_CONTEXT_CHARS);
    pub const RAW: Self = Self::new(DEFAULT_RAW_BEFORE, DEFAULT_RAW_AFTER);

    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }
}

impl Default for SnippetWindow {
    fn default() -> Self {
        Self::STRUCTURED
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// A validated, case-folded search keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    original: String,
    folded: Vec<char>,
}

impl Keyword {
    /// Fails with [`Error::InvalidArgument`] when `raw` is empty.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidArgument(
                "keyword must not be empty".into(),
            ));
        }
        Ok(Self {
            original: raw.to_string(),
            folded: raw.chars().map(fold).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.folded.len()
    }

    /// Case-insensitive substring test.
    pub fn is_found_in(&self, text: &str) -> bool {
        FoldedText::new(text).find_from(0, &self.folded).is_some()
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}

/// The original text alongside its folded characters.
struct FoldedText<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` at the end.
    offsets: Vec<usize>,
    folded: Vec<char>,
}

impl<'a> FoldedText<'a> {
    fn new(text: &'a str) -> Self {
        let mut offsets = Vec::with_capacity(text.len() + 1);
        let mut folded = Vec::with_capacity(text.len());
        for (offset, c) in text.char_indices() {
            offsets.push(offset);
            folded.push(fold(c));
        }
        offsets.push(text.len());
        Self {
            text,
            offsets,
            folded,
        }
    }

    fn char_len(&self) -> usize {
        self.folded.len()
    }

    fn matches_at(&self, pos: usize, needle: &[char]) -> bool {
        self.folded
            .get(pos..pos + needle.len())
            .is_some_and(|window| window == needle)
    }

    fn find_from(&self, from: usize, needle: &[char]) -> Option<usize> {
        let last = self.char_len().checked_sub(needle.len())?;
        (from..=last).find(|&pos| self.matches_at(pos, needle))
    }

    fn slice(&self, chars: Range<usize>) -> &'a str {
        &self.text[self.offsets[chars.start]..self.offsets[chars.end]]
    }
}

/// One keyword hit with its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Context text, with [`ELLIPSIS`] on each side that was cut.
    pub context: String,
    /// Character range of the context within the source text.
    pub chars: Range<usize>,
    /// Character position of the keyword hit.
    pub hit: usize,
    body: Range<usize>,
}

impl Snippet {
    /// The context without ellipsis markers.
    pub fn fragment(&self) -> &str {
        &self.context[self.body.clone()]
    }
}

impl std::fmt::Display for Snippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.context)
    }
}

impl From<Snippet> for String {
    fn from(snippet: Snippet) -> Self {
        snippet.context
    }
}

/// Iterator over the snippets of one text, in hit order.
///
/// Once a hit is emitted its keyword span is claimed, and later hits that
/// start inside a claimed span are skipped.
pub struct Snippets<'a> {
    text: FoldedText<'a>,
    needle: &'a [char],
    window: SnippetWindow,
    cursor: usize,
    claimed: ClaimedSpans,
}

impl<'a> Snippets<'a> {
    pub fn new(
        text: &'a str,
        keyword: &'a Keyword,
        window: SnippetWindow,
    ) -> Self {
        Self {
            text: FoldedText::new(text),
            needle: &keyword.folded,
            window,
            cursor: 0,
            claimed: ClaimedSpans::new(),
        }
    }

    fn snippet_at(&self, hit: usize) -> Snippet {
        let len = self.text.char_len();
        let start = hit.saturating_sub(self.window.before);
        let end = hit
            .saturating_add(self.needle.len())
            .saturating_add(self.window.after)
            .min(len);
        let fragment = self.text.slice(start..end);

        let mut context =
            String::with_capacity(fragment.len() + 2 * ELLIPSIS.len());
        if start > 0 {
            context.push_str(ELLIPSIS);
        }
        let body_start = context.len();
        context.push_str(fragment);
        let body_end = context.len();
        if end < len {
            context.push_str(ELLIPSIS);
        }

        Snippet {
            context,
            chars: start..end,
            hit,
            body: body_start..body_end,
        }
    }
}

impl Iterator for Snippets<'_> {
    type Item = Snippet;

    fn next(&mut self) -> Option<Snippet> {
        loop {
            let hit = self.text.find_from(self.cursor, self.needle)?;
            self.cursor = hit + 1;
            if self.claimed.contains(hit) {
                continue;
            }
            self.claimed.claim(hit, hit + self.needle.len());
            return Some(self.snippet_at(hit));
        }
    }
}

/// Snippets for raw page text where no kept fragment is a substring of
/// another.
///
/// A new snippet is dropped when its fragment already appears inside a kept
/// one. A kept snippet is replaced when the new fragment contains it, which
/// happens when an earlier window was clamped at the start of the text.
pub fn distinct_snippets(
    text: &str,
    keyword: &Keyword,
    window: SnippetWindow,
) -> Vec<Snippet> {
    let mut kept: Vec<Snippet> = Vec::new();
    // Character ranges of every window kept so far. Window starts and ends
    // never move backwards, so a window inside this set lies inside the
    // last kept window.
    let mut covered = ClaimedSpans::new();

    for snippet in Snippets::new(text, keyword, window) {
        if covered.covers(snippet.chars.start, snippet.chars.end) {
            continue;
        }
        // Same text repeated in a region that does not overlap.
        let fragment = snippet.fragment();
        if kept.iter().any(|prior| prior.fragment().contains(fragment)) {
            continue;
        }
        kept.retain(|prior| !fragment.contains(prior.fragment()));
        covered.claim(snippet.chars.start, snippet.chars.end);
        kept.push(snippet);
    }
    kept
}

/// Snippet contexts for every unclaimed occurrence of `keyword` in `text`.
pub fn extract(
    text: &str,
    keyword: &str,
    window: SnippetWindow,
) -> Result<Vec<String>> {
    let keyword = Keyword::new(keyword)?;
    Ok(Snippets::new(text, &keyword, window).map(String::from).collect())
}

/// Like [`extract`], with substring-duplicate suppression for raw page text.
pub fn extract_distinct(
    text: &str,
    keyword: &str,
    window: SnippetWindow,
) -> Result<Vec<String>> {
    let keyword = Keyword::new(keyword)?;
    Ok(distinct_snippets(text, &keyword, window)
        .into_iter()
        .map(String::from)
        .collect())
}
