use super::*;

/// Open/closed state of FAQ entries.
#[derive(Debug, Clone)]
pub(crate) struct Accordion {
    exclusive: bool,
    open_class: String,
    open_icon: String,
    closed_icon: String,
}

impl Accordion {
    pub(crate) fn new(config: &FaqConfig) -> Self {
        Self {
            exclusive: config.exclusive,
            open_class: config.open_class.clone(),
            open_icon: config.open_icon.clone(),
            closed_icon: config.closed_icon.clone(),
        }
    }

    pub(crate) fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Wires ARIA ids for one entry and forces it closed. `ordinal` is the
    /// 1-based position used for a generated answer id.
    pub(crate) fn prepare(&self, dom: &mut Dom, entry: &mut FaqEntry, ordinal: usize) -> Result<()> {
        let (Some(control), Some(answer)) = (entry.control, entry.answer) else {
            return Ok(());
        };

        let answer_id = match dom.attr(answer, "id").filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = format!("faq-answer-{ordinal}");
                dom.set_attr(answer, "id", &id)?;
                id
            }
        };
        dom.set_attr(control, "aria-controls", &answer_id)?;
        self.apply(dom, entry, false)
    }

    /// Sets one entry's open state. Returns whether the flag changed.
    /// Non-functional entries are left alone.
    pub(crate) fn set_open(&self, dom: &mut Dom, entry: &mut FaqEntry, open: bool) -> Result<bool> {
        if !entry.is_functional() {
            return Ok(false);
        }
        let changed = entry.open != open;
        self.apply(dom, entry, open)?;
        Ok(changed)
    }

    /// Closes every entry except `except`. Returns the ids that were open.
    pub(crate) fn close_all(
        &self,
        dom: &mut Dom,
        entries: &mut [FaqEntry],
        except: Option<EntryId>,
    ) -> Result<Vec<EntryId>> {
        let mut closed = Vec::new();
        for entry in entries.iter_mut() {
            if Some(entry.id) == except {
                continue;
            }
            if self.set_open(dom, entry, false)? {
                closed.push(entry.id);
            }
        }
        Ok(closed)
    }

    /// Flips one entry, first closing the others in exclusive mode.
    /// Returns the entry's new state, or `None` when it cannot open.
    pub(crate) fn toggle(
        &self,
        dom: &mut Dom,
        entries: &mut [FaqEntry],
        id: EntryId,
    ) -> Result<Option<bool>> {
        let Some(was_open) = entries
            .get(id.0)
            .filter(|entry| entry.is_functional())
            .map(|entry| entry.open)
        else {
            return Ok(None);
        };

        if self.exclusive {
            self.close_all(dom, entries, Some(id))?;
        }
        let entry = &mut entries[id.0];
        self.set_open(dom, entry, !was_open)?;
        Ok(Some(!was_open))
    }

    fn apply(&self, dom: &mut Dom, entry: &mut FaqEntry, open: bool) -> Result<()> {
        let (Some(control), Some(answer)) = (entry.control, entry.answer) else {
            return Ok(());
        };

        if open {
            dom.class_add(entry.item, &self.open_class)?;
            dom.set_attr(control, "aria-expanded", "true")?;
            dom.remove_attr(answer, "hidden")?;
        } else {
            dom.class_remove(entry.item, &self.open_class)?;
            dom.set_attr(control, "aria-expanded", "false")?;
            dom.set_attr(answer, "hidden", "")?;
        }
        if let Some(icon) = entry.icon {
            let glyph = if open {
                &self.open_icon
            } else {
                &self.closed_icon
            };
            dom.set_text_content(icon, glyph)?;
        }
        entry.open = open;
        Ok(())
    }
}
