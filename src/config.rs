use super::*;

/// CSS selectors that locate the widget's parts in the page.
///
/// `section`, `item` and `search_input` are matched against the whole
/// document; the remaining selectors are matched inside each item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqSelectors {
    pub section: String,
    pub item: String,
    pub question: String,
    pub answer: String,
    pub icon: String,
    pub question_text: String,
    pub answer_text: String,
    pub search_input: String,
}

impl Default for FaqSelectors {
    fn default() -> Self {
        Self {
            section: ".faq-section".into(),
            item: ".faq-item".into(),
            question: ".faq-question".into(),
            answer: ".faq-answer".into(),
            icon: ".faq-icon".into(),
            question_text: ".faq-q-text".into(),
            answer_text: ".faq-answer p".into(),
            search_input: "#faqSearch".into(),
        }
    }
}

impl FaqSelectors {
    fn all(&self) -> [(&'static str, &str); 8] {
        [
            ("section", self.section.as_str()),
            ("item", self.item.as_str()),
            ("question", self.question.as_str()),
            ("answer", self.answer.as_str()),
            ("icon", self.icon.as_str()),
            ("question_text", self.question_text.as_str()),
            ("answer_text", self.answer_text.as_str()),
            ("search_input", self.search_input.as_str()),
        ]
    }
}

/// Static widget configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqConfig {
    /// At most one entry open at a time.
    pub exclusive: bool,
    /// Close entries that a search hides.
    pub auto_close_hidden: bool,
    /// Quiet interval before a search runs, in milliseconds.
    pub debounce_ms: i64,
    pub selectors: FaqSelectors,
    pub open_class: String,
    pub open_icon: String,
    pub closed_icon: String,
    pub no_result_class: String,
    pub no_result_text: String,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            exclusive: true,
            auto_close_hidden: true,
            debounce_ms: 150,
            selectors: FaqSelectors::default(),
            open_class: "open".into(),
            open_icon: "▴".into(),
            closed_icon: "▾".into(),
            no_result_class: "faq-no-result".into(),
            no_result_text: "No results found. Try different keywords.".into(),
        }
    }
}

impl FaqConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclusive(mut self, enabled: bool) -> Self {
        self.exclusive = enabled;
        self
    }

    pub fn auto_close_hidden(mut self, enabled: bool) -> Self {
        self.auto_close_hidden = enabled;
        self
    }

    pub fn debounce_ms(mut self, delay_ms: i64) -> Self {
        self.debounce_ms = delay_ms;
        self
    }

    pub fn selectors(mut self, selectors: FaqSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn no_result_text(mut self, text: impl Into<String>) -> Self {
        self.no_result_text = text.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "debounce_ms must be non-negative (got {})",
                self.debounce_ms
            )));
        }
        if self.open_class.split_whitespace().count() != 1 {
            return Err(Error::InvalidConfig(format!(
                "open_class must be a single class token (got {:?})",
                self.open_class
            )));
        }
        if self.no_result_class.split_whitespace().count() != 1 {
            return Err(Error::InvalidConfig(format!(
                "no_result_class must be a single class token (got {:?})",
                self.no_result_class
            )));
        }
        for (name, selector) in self.selectors.all() {
            SelectorList::parse(selector).map_err(|_| {
                Error::UnsupportedSelector(format!("{name}: {selector}"))
            })?;
        }
        Ok(())
    }
}
