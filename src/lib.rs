use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod accordion;
mod config;
mod dom;
mod entry;
mod html;
mod markup;
mod pattern;
mod runtime_state;
mod search;
mod selector;
mod widget;

pub(crate) use accordion::Accordion;
pub(crate) use dom::*;
pub(crate) use entry::TextSlot;
pub(crate) use html::{is_void_tag, parse_html};
pub(crate) use markup::*;
pub(crate) use runtime_state::*;
pub(crate) use search::SearchFilter;
pub(crate) use selector::*;

pub use config::{FaqConfig, FaqSelectors};
pub use entry::{EntryId, FaqEntry};
pub use pattern::{HighlightSegment, escape_pattern, highlight_segments, normalize_keyword};
pub use runtime_state::PendingTimer;
pub use search::FilterOutcome;
pub use widget::FaqWidget;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    InvalidConfig(String),
    Pattern(String),
    SelectorNotFound(String),
    Timer(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Pattern(msg) => write!(f, "pattern error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::Timer(msg) => write!(f, "timer error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
