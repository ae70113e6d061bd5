//! Cooperative timers for the active app.
//!
//! Apps never spawn background work. They schedule timer ids here and the
//! framework delivers each due id through [`App::on_timer`] during the tick.
//! Stopping an app clears its queue, which is how its pending work is
//! cancelled.
//!
//! [`App::on_timer`]: crate::app::App::on_timer

/// App-chosen identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due_ms: u64,
    period_ms: Option<u64>,
    /// Insertion order, breaks ties between timers due at the same time.
    seq: u64,
}

/// Pending timers of the active app.
#[derive(Debug, Default)]
pub struct TaskQueue {
    timers: Vec<Timer>,
    now_ms: u64,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock reading used as the base for newly scheduled timers.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance the scheduling clock. The framework calls this once per tick.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Fire `id` every `period_ms`, first after one period. Replaces any
    /// timer already scheduled under the same id.
    pub fn every(&mut self, period_ms: u64, id: TimerId) {
        let period = period_ms.max(1);
        self.schedule(id, self.now_ms + period, Some(period));
    }

    /// Fire `id` once after `delay_ms`. Replaces any timer with the same id.
    pub fn after(&mut self, delay_ms: u64, id: TimerId) {
        self.schedule(id, self.now_ms + delay_ms, None);
    }

    /// Fire `id` once on the next timer pass.
    pub fn defer(&mut self, id: TimerId) {
        self.after(0, id);
    }

    /// Cancel a timer. Returns whether one was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        if !self.timers.is_empty() {
            log::debug!("[tasks] cancelled {} timer(s)", self.timers.len());
        }
        self.timers.clear();
    }

    /// Remove and return the ids due at `now_ms`, earliest first.
    ///
    /// One-shot timers are dropped. Periodic timers fire at most once per
    /// pass and are rescheduled one period after their due time, or one
    /// period after `now_ms` if they fell behind.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerId> {
        self.now_ms = now_ms;
        let mut due: Vec<(u64, u64, TimerId)> = Vec::new();
        self.timers.retain_mut(|t| {
            if t.due_ms > now_ms {
                return true;
            }
            due.push((t.due_ms, t.seq, t.id));
            match t.period_ms {
                Some(period) => {
                    t.due_ms += period;
                    if t.due_ms <= now_ms {
                        t.due_ms = now_ms + period;
                    }
                    true
                },
                None => false,
            }
        });
        due.sort_unstable();
        due.into_iter().map(|(_, _, id)| id).collect()
    }

    fn schedule(&mut self, id: TimerId, due_ms: u64, period_ms: Option<u64>) {
        self.timers.retain(|t| t.id != id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            id,
            due_ms,
            period_ms,
            seq,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TimerId = TimerId(1);
    const B: TimerId = TimerId(2);

    #[test]
    fn one_shot_fires_once() {
        let mut q = TaskQueue::new();
        q.after(100, A);
        assert!(q.take_due(99).is_empty());
        assert_eq!(q.take_due(100), vec![A]);
        assert!(q.take_due(500).is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn defer_fires_on_next_pass() {
        let mut q = TaskQueue::new();
        q.set_now(40);
        q.defer(A);
        assert_eq!(q.take_due(40), vec![A]);
    }

    #[test]
    fn periodic_reschedules() {
        let mut q = TaskQueue::new();
        q.every(50, A);
        assert!(q.take_due(49).is_empty());
        assert_eq!(q.take_due(50), vec![A]);
        assert!(q.take_due(99).is_empty());
        assert_eq!(q.take_due(100), vec![A]);
        assert!(q.is_scheduled(A));
    }

    #[test]
    fn periodic_skips_missed_periods() {
        let mut q = TaskQueue::new();
        q.every(10, A);
        // A long stall only fires once.
        assert_eq!(q.take_due(1000), vec![A]);
        assert!(q.take_due(1009).is_empty());
        assert_eq!(q.take_due(1010), vec![A]);
    }

    #[test]
    fn due_order_then_insertion_order() {
        let mut q = TaskQueue::new();
        q.after(20, B);
        q.after(10, A);
        q.after(20, TimerId(3));
        assert_eq!(q.take_due(30), vec![A, B, TimerId(3)]);
    }

    #[test]
    fn rescheduling_replaces() {
        let mut q = TaskQueue::new();
        q.after(10, A);
        q.after(50, A);
        assert_eq!(q.len(), 1);
        assert!(q.take_due(10).is_empty());
        assert_eq!(q.take_due(50), vec![A]);
    }

    #[test]
    fn cancel_and_clear() {
        let mut q = TaskQueue::new();
        q.every(10, A);
        q.after(10, B);
        assert!(q.cancel(A));
        assert!(!q.cancel(A));
        q.clear();
        assert!(q.take_due(100).is_empty());
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut q = TaskQueue::new();
        q.every(0, A);
        assert_eq!(q.take_due(1), vec![A]);
        assert!(q.take_due(1).is_empty());
    }
}
