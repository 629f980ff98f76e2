use super::*;

/// Interaction capabilities a node can expose to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Capability {
    /// Pointer click, or Enter/Space while the node has keyboard focus.
    Activate,
    /// The node's text value changed.
    TextChange,
}

impl Capability {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::TextChange => "text-change",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    ToggleEntry(EntryId),
    ScheduleSearch,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<Capability, Vec<Handler>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, capability: Capability, handler: Handler) {
        let handlers = self
            .map
            .entry(node_id)
            .or_default()
            .entry(capability)
            .or_default();
        // Registering the same handler twice must not double its effect.
        if !handlers.contains(&handler) {
            handlers.push(handler);
        }
    }

    pub(crate) fn get(&self, node_id: NodeId, capability: Capability) -> Vec<Handler> {
        self.map
            .get(&node_id)
            .and_then(|capabilities| capabilities.get(&capability))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask<T> {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) payload: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

/// Virtual-clock timer queue. Tasks run in `(due_at, order)` order and only
/// when the owner advances the clock.
#[derive(Debug)]
pub(crate) struct TimerQueue<T> {
    task_queue: Vec<ScheduledTask<T>>,
    now_ms: i64,
    next_timer_id: i64,
    next_task_order: i64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn schedule_after(&mut self, delay_ms: i64, payload: T) -> i64 {
        let delay_ms = delay_ms.max(0);
        let due_at = self.now_ms.saturating_add(delay_ms);
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            payload,
        });
        id
    }

    pub(crate) fn cancel(&mut self, id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != id);
        before != self.task_queue.len()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let cleared = self.task_queue.len();
        self.task_queue.clear();
        cleared
    }

    pub(crate) fn pending(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub(crate) fn set_now(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    /// Removes and returns the earliest task due at or before `due_limit`
    /// (any task when `None`). The clock moves forward to the task's due time
    /// when `advance_clock` is set.
    pub(crate) fn pop_next(
        &mut self,
        due_limit: Option<i64>,
        advance_clock: bool,
    ) -> Option<ScheduledTask<T>> {
        let next_idx = self
            .task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)?;
        let task = self.task_queue.remove(next_idx);
        if advance_clock && task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        Some(task)
    }
}

/// Coalesces bursts of requests into one scheduled task per quiet period.
#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    pending: Option<i64>,
}

impl Debouncer {
    /// Cancels any outstanding task and schedules a fresh one. Returns the new
    /// timer id and the id of the task it replaced, if any was still queued.
    pub(crate) fn schedule<T>(
        &mut self,
        queue: &mut TimerQueue<T>,
        delay_ms: i64,
        payload: T,
    ) -> (i64, Option<i64>) {
        let replaced = self.pending.take().filter(|id| queue.cancel(*id));
        let id = queue.schedule_after(delay_ms, payload);
        self.pending = Some(id);
        (id, replaced)
    }

    pub(crate) fn fired(&mut self, id: i64) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

impl TraceState {
    pub(crate) fn event_line(&mut self, line: String) {
        if self.enabled && self.events {
            self.line(line);
        }
    }

    pub(crate) fn timer_line(&mut self, line: String) {
        if self.enabled && self.timers {
            self.line(line);
        }
    }

    pub(crate) fn line(&mut self, line: String) {
        if self.enabled {
            if self.to_stderr {
                eprintln!("{line}");
            }
            if self.logs.len() >= self.log_limit {
                self.logs.pop_front();
            }
            self.logs.push_back(line);
        }
    }

    pub(crate) fn set_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.log_limit = max_entries;
        while self.logs.len() > self.log_limit {
            self.logs.pop_front();
        }
        Ok(())
    }
}
