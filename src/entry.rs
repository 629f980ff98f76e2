use super::*;

/// Zero-based position of an entry inside its FAQ section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

/// A text holder together with the text it had when the widget started.
#[derive(Debug, Clone)]
pub(crate) struct TextSlot {
    pub(crate) node: NodeId,
    pub(crate) original: String,
}

/// One question/answer pair and the nodes that make it up.
///
/// Content never changes after initialization; only `open` and `visible` do.
#[derive(Debug, Clone)]
pub struct FaqEntry {
    pub(crate) id: EntryId,
    pub(crate) item: NodeId,
    pub(crate) control: Option<NodeId>,
    pub(crate) answer: Option<NodeId>,
    pub(crate) icon: Option<NodeId>,
    pub(crate) question_text: Option<TextSlot>,
    pub(crate) answer_text: Option<TextSlot>,
    pub(crate) open: bool,
    pub(crate) visible: bool,
}

impl FaqEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn question(&self) -> &str {
        self.question_text
            .as_ref()
            .map(|slot| slot.original.as_str())
            .unwrap_or_default()
    }

    pub fn answer(&self) -> &str {
        self.answer_text
            .as_ref()
            .map(|slot| slot.original.as_str())
            .unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Entries without a question control or answer block never open.
    pub fn is_functional(&self) -> bool {
        self.control.is_some() && self.answer.is_some()
    }

    /// Question and answer originals joined by one space, the text a keyword
    /// is matched against.
    pub(crate) fn search_text(&self) -> String {
        format!("{} {}", self.question(), self.answer())
    }

    pub(crate) fn text_slots(&self) -> impl Iterator<Item = &TextSlot> {
        self.question_text.iter().chain(self.answer_text.iter())
    }
}
