//! Fixed-delay timers driven by the frame clock.
//!
//! Nothing here touches the platform: the frame loop calls [`Timers::advance`]
//! with the current time and handles whatever fired. Cancelling a hall is then
//! just [`Timers::clear`], with nothing left behind in the browser's queue.

use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Timer<T> {
    id: TimerId,
    due_ms: f64,
    period_ms: Option<f64>,
    event: T,
}

#[derive(Clone, Debug)]
pub struct Timers<T> {
    now_ms: f64,
    next_id: u64,
    pending: Vec<Timer<T>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T: Clone> Timers<T> {
    pub fn new(now_ms: f64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn push(&mut self, delay_ms: f64, period_ms: Option<f64>, event: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timer {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            period_ms,
            event,
        });
        id
    }

    pub fn schedule_once(&mut self, delay_ms: f64, event: T) -> TimerId {
        self.push(delay_ms, None, event)
    }

    /// Repeats every `period_ms` until cancelled. Fires at most once per
    /// `advance`, so a long stall does not replay missed ticks.
    pub fn schedule_interval(&mut self, period_ms: f64, event: T) -> TimerId {
        let period = period_ms.max(1.0);
        self.push(period, Some(period), event)
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Move the clock to `now_ms` and return the events that became due, in
    /// due order.
    pub fn advance(&mut self, now_ms: f64) -> SmallVec<[(TimerId, T); 8]> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        let mut fired: SmallVec<[(f64, TimerId, T); 8]> = SmallVec::new();
        self.pending.retain_mut(|t| {
            if t.due_ms > now {
                return true;
            }
            fired.push((t.due_ms, t.id, t.event.clone()));
            match t.period_ms {
                Some(period) => {
                    let next = t.due_ms + period;
                    t.due_ms = if next > now { next } else { now + period };
                    true
                }
                None => false,
            }
        });
        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, id, ev)| (id, ev)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_fires_a_single_time() {
        let mut t = Timers::new(0.0);
        t.schedule_once(100.0, 'a');
        assert!(t.advance(99.0).is_empty());
        assert_eq!(t.advance(100.0).len(), 1);
        assert!(t.advance(1000.0).is_empty());
        assert_eq!(t.outstanding(), 0);
    }

    #[test]
    fn interval_repeats_until_cancelled() {
        let mut t = Timers::new(0.0);
        let id = t.schedule_interval(50.0, ());
        let mut count = 0;
        for frame in 1..=10 {
            count += t.advance(frame as f64 * 25.0).len();
        }
        assert_eq!(count, 5);
        assert!(t.cancel(id));
        assert!(!t.cancel(id));
        assert!(t.advance(10_000.0).is_empty());
    }

    #[test]
    fn stall_does_not_replay_ticks() {
        let mut t = Timers::new(0.0);
        t.schedule_interval(50.0, ());
        assert_eq!(t.advance(5_000.0).len(), 1);
        assert_eq!(t.advance(5_049.0).len(), 0);
        assert_eq!(t.advance(5_050.0).len(), 1);
    }

    #[test]
    fn fired_in_due_order() {
        let mut t = Timers::new(0.0);
        t.schedule_once(30.0, 2);
        t.schedule_once(10.0, 1);
        let fired: Vec<i32> = t.advance(40.0).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec![1, 2]);
    }
}
