use super::*;

/// Result of one filter pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Keyword after normalization; empty means "show everything".
    pub keyword: String,
    pub visible: usize,
    pub total: usize,
    /// Entries the pass hid and force-closed.
    pub auto_closed: Vec<EntryId>,
    /// Text holders left un-highlighted because the pattern failed.
    pub highlight_failures: usize,
}

impl FilterOutcome {
    pub fn no_results(&self) -> bool {
        self.visible == 0
    }
}

/// Keyword-driven visibility and highlighting of FAQ entries.
#[derive(Debug, Clone)]
pub(crate) struct SearchFilter {
    auto_close_hidden: bool,
    no_result: Option<NodeId>,
}

impl SearchFilter {
    pub(crate) fn new(config: &FaqConfig, no_result: Option<NodeId>) -> Self {
        Self {
            auto_close_hidden: config.auto_close_hidden,
            no_result,
        }
    }

    pub(crate) fn no_result_node(&self) -> Option<NodeId> {
        self.no_result
    }

    pub(crate) fn filter(
        &self,
        dom: &mut Dom,
        entries: &mut [FaqEntry],
        accordion: &Accordion,
        raw_keyword: &str,
    ) -> Result<FilterOutcome> {
        let keyword = normalize_keyword(raw_keyword);
        let mut outcome = FilterOutcome {
            keyword: keyword.clone(),
            visible: 0,
            total: entries.len(),
            auto_closed: Vec::new(),
            highlight_failures: 0,
        };

        for entry in entries.iter_mut() {
            restore_original_text(dom, entry)?;

            if keyword.is_empty() {
                set_visible(dom, entry, true)?;
                outcome.visible += 1;
                continue;
            }

            if pattern::contains_keyword(&entry.search_text(), &keyword) {
                set_visible(dom, entry, true)?;
                outcome.visible += 1;
                for slot in entry.text_slots() {
                    if render_highlight(dom, slot, &keyword).is_err() {
                        // The slot already shows its original text.
                        outcome.highlight_failures += 1;
                    }
                }
            } else {
                set_visible(dom, entry, false)?;
                if self.auto_close_hidden && accordion.set_open(dom, entry, false)? {
                    outcome.auto_closed.push(entry.id);
                }
            }
        }

        if let Some(no_result) = self.no_result {
            let display = if outcome.no_results() {
                None
            } else {
                Some("none")
            };
            dom.set_style_property(no_result, "display", display)?;
        }

        Ok(outcome)
    }
}

fn restore_original_text(dom: &mut Dom, entry: &FaqEntry) -> Result<()> {
    for slot in entry.text_slots() {
        dom.set_text_content(slot.node, &slot.original)?;
    }
    Ok(())
}

fn set_visible(dom: &mut Dom, entry: &mut FaqEntry, visible: bool) -> Result<()> {
    let display = if visible { None } else { Some("none") };
    dom.set_style_property(entry.item, "display", display)?;
    entry.visible = visible;
    Ok(())
}

/// Rebuilds a text holder from its original text, wrapping keyword hits in
/// `<mark>`. Nothing is touched when the pattern cannot be built.
fn render_highlight(dom: &mut Dom, slot: &TextSlot, keyword: &str) -> Result<()> {
    let segments = highlight_segments(&slot.original, keyword)?;
    dom.clear_children(slot.node)?;
    for segment in segments {
        match segment {
            HighlightSegment::Plain(text) => {
                dom.append_text(slot.node, &text)?;
            }
            HighlightSegment::Marked(text) => {
                let mark = dom.append_element(slot.node, "mark")?;
                dom.append_text(mark, &text)?;
            }
        }
    }
    Ok(())
}
