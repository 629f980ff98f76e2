use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetTask {
    RunSearch,
}

/// A mounted FAQ widget: accordion entries, the search box, and the
/// "no results" indicator, all living in one in-memory document.
///
/// The widget owns its clock. Debounced searches only run when time is
/// advanced with [`FaqWidget::advance_time`] or one of its siblings.
#[derive(Debug)]
pub struct FaqWidget {
    dom: Dom,
    config: FaqConfig,
    entries: Vec<FaqEntry>,
    accordion: Accordion,
    search: SearchFilter,
    search_input: Option<NodeId>,
    listeners: ListenerStore,
    scheduler: TimerQueue<WidgetTask>,
    debouncer: Debouncer,
    filter_passes: usize,
    last_filter: Option<FilterOutcome>,
    trace_state: TraceState,
}

impl FaqWidget {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, FaqConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: FaqConfig) -> Result<Self> {
        config.validate()?;
        let dom = parse_html(html)?;
        Self::mount(dom, config)
    }

    fn mount(mut dom: Dom, config: FaqConfig) -> Result<Self> {
        let selectors = &config.selectors;
        let section = dom.query_selector(&selectors.section)?;
        let items = dom.query_selector_all(&selectors.item)?;
        let accordion = Accordion::new(&config);

        // Pages without an FAQ keep the widget inert.
        let Some(section) = section.filter(|_| !items.is_empty()) else {
            let search = SearchFilter::new(&config, None);
            return Ok(Self::assemble(dom, config, Vec::new(), accordion, search, None));
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut entry = FaqEntry {
                id: EntryId(index),
                item,
                control: dom.query_selector_from(item, &selectors.question)?,
                answer: dom.query_selector_from(item, &selectors.answer)?,
                icon: dom.query_selector_from(item, &selectors.icon)?,
                question_text: capture_slot(&dom, item, &selectors.question_text)?,
                answer_text: capture_slot(&dom, item, &selectors.answer_text)?,
                open: false,
                visible: true,
            };
            accordion.prepare(&mut dom, &mut entry, index + 1)?;
            entries.push(entry);
        }

        let no_result = dom.append_element(section, "p")?;
        dom.set_attr(no_result, "class", &config.no_result_class)?;
        dom.set_text_content(no_result, &config.no_result_text)?;
        dom.set_style_property(no_result, "display", Some("none"))?;

        let search_input = dom.query_selector(&selectors.search_input)?;
        let search = SearchFilter::new(&config, Some(no_result));
        let mut widget = Self::assemble(dom, config, entries, accordion, search, search_input);

        for entry in &widget.entries {
            if let (true, Some(control)) = (entry.is_functional(), entry.control) {
                widget.listeners.add(
                    control,
                    Capability::Activate,
                    Handler::ToggleEntry(entry.id),
                );
            }
        }
        if let Some(input) = search_input {
            widget
                .listeners
                .add(input, Capability::TextChange, Handler::ScheduleSearch);
        }

        Ok(widget)
    }

    fn assemble(
        dom: Dom,
        config: FaqConfig,
        entries: Vec<FaqEntry>,
        accordion: Accordion,
        search: SearchFilter,
        search_input: Option<NodeId>,
    ) -> Self {
        Self {
            dom,
            config,
            entries,
            accordion,
            search,
            search_input,
            listeners: ListenerStore::default(),
            scheduler: TimerQueue::default(),
            debouncer: Debouncer::default(),
            filter_passes: 0,
            last_filter: None,
            trace_state: TraceState::default(),
        }
    }

    pub fn config(&self) -> &FaqConfig {
        &self.config
    }

    /// True when the page had no FAQ section or no entries.
    pub fn is_inert(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&FaqEntry> {
        self.entries.get(id.0)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_open(&self, id: EntryId) -> bool {
        self.entry(id).is_some_and(FaqEntry::is_open)
    }

    pub fn is_visible(&self, id: EntryId) -> bool {
        self.entry(id).is_some_and(FaqEntry::is_visible)
    }

    pub fn open_entries(&self) -> Vec<EntryId> {
        self.entries
            .iter()
            .filter(|entry| entry.open)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.visible).count()
    }

    pub fn is_no_result_shown(&self) -> bool {
        self.search
            .no_result_node()
            .is_some_and(|node| self.dom.style_property(node, "display").as_deref() != Some("none"))
    }

    /// Serialized markup currently shown for the question text.
    pub fn question_markup(&self, id: EntryId) -> Option<String> {
        self.entry(id)
            .and_then(|entry| entry.question_text.as_ref())
            .map(|slot| self.dom.inner_html(slot.node))
    }

    /// Serialized markup currently shown for the answer text.
    pub fn answer_markup(&self, id: EntryId) -> Option<String> {
        self.entry(id)
            .and_then(|entry| entry.answer_text.as_ref())
            .map(|slot| self.dom.inner_html(slot.node))
    }

    pub fn search_value(&self) -> Option<&str> {
        self.search_input.and_then(|input| self.dom.value(input))
    }

    /// Number of filter passes executed so far, immediate and debounced.
    pub fn filter_passes(&self) -> usize {
        self.filter_passes
    }

    pub fn last_filter(&self) -> Option<&FilterOutcome> {
        self.last_filter.as_ref()
    }

    pub fn set_open(&mut self, id: EntryId, open: bool) -> Result<()> {
        let Some(entry) = self.entries.get_mut(id.0) else {
            return Ok(());
        };
        let changed = self.accordion.set_open(&mut self.dom, entry, open)?;
        self.trace_state.line(format!(
            "[accordion] set_open {id} open={open} changed={changed}"
        ));
        Ok(())
    }

    pub fn close_all(&mut self, except: Option<EntryId>) -> Result<()> {
        let closed = self
            .accordion
            .close_all(&mut self.dom, &mut self.entries, except)?;
        self.trace_state.line(format!(
            "[accordion] close_all except={} closed={}",
            describe_entry(except),
            describe_entries(&closed)
        ));
        Ok(())
    }

    pub fn toggle(&mut self, id: EntryId) -> Result<()> {
        let open_before = self.open_entries();
        let outcome = self.accordion.toggle(&mut self.dom, &mut self.entries, id)?;
        match outcome {
            Some(open) => {
                let closed = open_before
                    .into_iter()
                    .filter(|other| *other != id && !self.is_open(*other))
                    .collect::<Vec<_>>();
                self.trace_state.line(format!(
                    "[accordion] toggle {id} open={open} exclusive={} closed_others={}",
                    self.accordion.is_exclusive(),
                    describe_entries(&closed)
                ));
            }
            None => {
                self.trace_state
                    .line(format!("[accordion] toggle {id} skipped=non-functional"));
            }
        }
        Ok(())
    }

    /// Runs one filter pass immediately, bypassing the debounce.
    pub fn filter(&mut self, keyword: &str) -> Result<FilterOutcome> {
        let outcome = self
            .search
            .filter(&mut self.dom, &mut self.entries, &self.accordion, keyword)?;
        self.filter_passes += 1;
        self.trace_state.line(format!(
            "[filter] pass={} keyword={:?} visible={}/{} auto_closed={} highlight_failures={}",
            self.filter_passes,
            outcome.keyword,
            outcome.visible,
            outcome.total,
            describe_entries(&outcome.auto_closed),
            outcome.highlight_failures
        ));
        self.last_filter = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch(target, Capability::Activate)
    }

    /// Enter and Space activate the target exactly like a click; other keys
    /// are ignored.
    pub fn press_key(&mut self, selector: &str, key: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if matches!(key, "Enter" | " ") {
            return self.dispatch(target, Capability::Activate);
        }
        let label = self.describe_node(target);
        self.trace_state
            .event_line(format!("[event] keydown target={label} key={key:?} ignored"));
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch(target, Capability::TextChange)
    }

    /// Delivers `capability` to `target` and then to each ancestor, the way
    /// a click on a button's inner span reaches the button.
    fn dispatch(&mut self, target: NodeId, capability: Capability) -> Result<()> {
        let mut handlers = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            handlers.extend(self.listeners.get(node, capability));
            cursor = self.dom.parent(node);
        }

        let label = self.describe_node(target);
        self.trace_state.event_line(format!(
            "[event] {} target={label} handlers={}",
            capability.as_str(),
            handlers.len()
        ));

        for handler in handlers {
            self.run_handler(handler)?;
        }
        Ok(())
    }

    fn run_handler(&mut self, handler: Handler) -> Result<()> {
        match handler {
            Handler::ToggleEntry(id) => self.toggle(id),
            Handler::ScheduleSearch => {
                let delay_ms = self.config.debounce_ms;
                let (id, replaced) =
                    self.debouncer
                        .schedule(&mut self.scheduler, delay_ms, WidgetTask::RunSearch);
                let due_at = self.scheduler.now_ms().saturating_add(delay_ms);
                self.trace_state.timer_line(format!(
                    "[timer] schedule search id={id} due_at={due_at} replaced={}",
                    replaced.map_or_else(|| "none".to_string(), |id| id.to_string())
                ));
                Ok(())
            }
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms()
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = self.scheduler.clear();
        self.debouncer.reset();
        self.trace_state
            .timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Timer(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms();
        let to = from.saturating_add(delta_ms);
        let ran = self.run_until(to)?;
        self.trace_state.timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={to} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let from = self.now_ms();
        if target_ms < from {
            return Err(Error::Timer(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={from})"
            )));
        }
        let ran = self.run_until(target_ms)?;
        self.trace_state.timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every pending task, moving the clock to each task's due time.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms();
        let mut ran = 0usize;
        while let Some(task) = self.scheduler.pop_next(None, true) {
            self.execute_task(task)?;
            ran += 1;
        }
        self.trace_state.timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.now_ms()
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(task) = self.scheduler.pop_next(None, true) else {
            self.trace_state.timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        self.execute_task(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let now = self.now_ms();
        self.run_until(now)
    }

    // Tasks run at their own due time so that anything they schedule is
    // timed from that instant, not from the end of the advance.
    fn run_until(&mut self, target_ms: i64) -> Result<usize> {
        let mut ran = 0usize;
        while let Some(task) = self.scheduler.pop_next(Some(target_ms), true) {
            self.execute_task(task)?;
            ran += 1;
        }
        self.scheduler.set_now(target_ms.max(self.scheduler.now_ms()));
        Ok(ran)
    }

    fn execute_task(&mut self, task: ScheduledTask<WidgetTask>) -> Result<()> {
        self.debouncer.fired(task.id);
        self.trace_state.timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            task.id,
            task.due_at,
            self.now_ms()
        ));
        match task.payload {
            WidgetTask::RunSearch => {
                let keyword = self.search_value().unwrap_or_default().to_string();
                self.filter(&keyword)?;
            }
        }
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_inner_html(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.inner_html(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_attr(&self, selector: &str, name: &str, expected: Option<&str>) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.attr(target, name);
        if actual.as_deref() != expected {
            return Err(Error::AssertionFailed {
                selector: format!("{selector}[{name}]"),
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn inner_html(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.inner_html(target))
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace_state.set_log_limit(max_entries)
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn describe_node(&self, node_id: NodeId) -> String {
        let tag = self.dom.tag_name(node_id).unwrap_or("#node");
        match self.dom.attr(node_id, "id").filter(|id| !id.is_empty()) {
            Some(id) => format!("{tag}#{id}"),
            None => match self.dom.attr(node_id, "class") {
                Some(class) if !class.is_empty() => {
                    format!("{tag}.{}", class.split_whitespace().collect::<Vec<_>>().join("."))
                }
                _ => tag.to_string(),
            },
        }
    }
}

fn capture_slot(dom: &Dom, item: NodeId, selector: &str) -> Result<Option<TextSlot>> {
    Ok(dom.query_selector_from(item, selector)?.map(|node| TextSlot {
        node,
        original: dom.text_content(node),
    }))
}

fn describe_entry(id: Option<EntryId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

fn describe_entries(ids: &[EntryId]) -> String {
    let parts = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
    format!("[{}]", parts.join(","))
}
