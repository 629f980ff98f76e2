use std::borrow::Cow;

use super::*;

/// Case-insensitive literal matcher used for keyword highlighting.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    backend: fancy_regex::Regex,
}

impl Pattern {
    /// Compiles `keyword` as literal text. Pattern syntax inside the keyword
    /// is escaped, so `"a.b"` only matches a literal dot.
    pub(crate) fn literal_case_insensitive(keyword: &str) -> std::result::Result<Self, PatternError> {
        let mut builder = fancy_regex::RegexBuilder::new(&escape_pattern(keyword));
        builder.case_insensitive(true);
        let backend = builder.build().map_err(PatternError::from)?;
        Ok(Self { backend })
    }

    pub(crate) fn find_all(&self, input: &str) -> std::result::Result<Vec<Match>, PatternError> {
        let mut out = Vec::new();
        for matched in self.backend.find_iter(input) {
            let matched = matched.map_err(PatternError::from)?;
            // Zero-width hits cannot be highlighted.
            if matched.start() < matched.end() {
                out.push(Match {
                    start: matched.start(),
                    end: matched.end(),
                });
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternError {
    message: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PatternError {}

impl From<fancy_regex::Error> for PatternError {
    fn from(value: fancy_regex::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

impl From<PatternError> for Error {
    fn from(value: PatternError) -> Self {
        Error::Pattern(value.message)
    }
}

/// Backslash-escapes every character that carries meaning in pattern syntax.
pub fn escape_pattern(value: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;

    for ch in value.chars() {
        if is_pattern_meta(ch) {
            out.push('\\');
            changed = true;
        }
        out.push(ch);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(value)
    }
}

fn is_pattern_meta(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$'
    )
}

/// Canonical search form of raw input: trimmed and lowercased. Code points
/// are left as typed so a decomposed keyword still finds decomposed text.
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether `haystack` contains the already-normalized `keyword`, ignoring case.
pub(crate) fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    haystack.to_lowercase().contains(keyword)
}

/// One run of display text, either plain or wrapped in highlight markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightSegment {
    Plain(String),
    Marked(String),
}

impl HighlightSegment {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Marked(text) => text,
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Self::Marked(_))
    }
}

/// Splits `original` into plain and marked runs for `keyword`.
///
/// The result depends only on its two inputs, and concatenating the segment
/// texts always yields `original` unchanged. Matched runs keep the casing they
/// have in `original`. An empty keyword yields the whole text as one plain run.
pub fn highlight_segments(original: &str, keyword: &str) -> Result<Vec<HighlightSegment>> {
    if keyword.is_empty() {
        return Ok(plain_only(original));
    }

    let pattern = Pattern::literal_case_insensitive(keyword)?;
    let matches = pattern.find_all(original)?;

    let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0usize;
    for Match { start, end } in matches {
        if start > cursor {
            segments.push(HighlightSegment::Plain(original[cursor..start].to_string()));
        }
        segments.push(HighlightSegment::Marked(original[start..end].to_string()));
        cursor = end;
    }
    if cursor < original.len() {
        segments.push(HighlightSegment::Plain(original[cursor..].to_string()));
    }
    Ok(segments)
}

fn plain_only(original: &str) -> Vec<HighlightSegment> {
    if original.is_empty() {
        Vec::new()
    } else {
        vec![HighlightSegment::Plain(original.to_string())]
    }
}
