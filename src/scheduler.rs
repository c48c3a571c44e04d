//! Single-threaded timer + animation-frame queue.
//!
//! Nothing here runs on its own: the owner advances the clock and dispatches
//! whatever comes due. Time is in milliseconds.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

struct Timer<T> {
    id: TimerId,
    due: f64,
    period: Option<f64>,
    /// Creation order; breaks ties between timers due at the same instant.
    seq: u64,
    task: T,
}

pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    timers: Vec<Timer<T>>,
    frames: Vec<(FrameId, T)>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now: f64) -> Self {
        Self { now, next_id: 0, timers: Vec::new(), frames: Vec::new() }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    fn bump(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn set_interval(&mut self, period_ms: f64, task: T) -> TimerId {
        let period = period_ms.max(1.0);
        self.push_timer(period, Some(period), task)
    }

    pub fn set_timeout(&mut self, delay_ms: f64, task: T) -> TimerId {
        self.push_timer(delay_ms.max(0.0), None, task)
    }

    fn push_timer(&mut self, delay: f64, period: Option<f64>, task: T) -> TimerId {
        let seq = self.bump();
        let id = TimerId(seq);
        self.timers.push(Timer { id, due: self.now + delay, period, seq, task });
        id
    }

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    pub fn clear(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    pub fn request_frame(&mut self, task: T) -> FrameId {
        let id = FrameId(self.bump());
        self.frames.push((id, task));
        id
    }

    pub fn cancel_frame(&mut self, id: FrameId) {
        self.frames.retain(|(f, _)| *f != id);
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Intervals are re-armed before the task is handed out.
    pub fn next_due(&mut self, until: f64) -> Option<T> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;

        let due = self.timers[idx].due;
        self.now = self.now.max(due);
        match self.timers[idx].period {
            Some(period) => {
                let seq = self.bump();
                let timer = &mut self.timers[idx];
                timer.due += period;
                timer.seq = seq;
                Some(timer.task.clone())
            }
            None => Some(self.timers.swap_remove(idx).task),
        }
    }

    /// Move the clock forward without firing anything.
    pub fn advance_clock(&mut self, time: f64) {
        self.now = self.now.max(time);
    }

    /// Drain the frame callbacks requested so far. Requests made while the
    /// drained tasks run wait for the next frame.
    pub fn take_frames(&mut self, time: f64) -> Vec<T> {
        self.advance_clock(time);
        std::mem::take(&mut self.frames).into_iter().map(|(_, t)| t).collect()
    }

    pub fn clear_all(&mut self) {
        self.timers.clear();
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: f64) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(t) = s.next_due(until) {
            out.push(t);
        }
        out
    }

    #[test]
    fn intervals_repeat_in_due_order() {
        let mut s = Scheduler::new(0.0);
        s.set_interval(100.0, "a");
        s.set_interval(150.0, "b");
        assert_eq!(drain(&mut s, 300.0), vec!["a", "b", "a", "b", "a"]);
        assert_eq!(s.now(), 300.0);
    }

    #[test]
    fn timeouts_fire_once_and_clear_cancels() {
        let mut s = Scheduler::new(0.0);
        let keep = s.set_timeout(10.0, "keep");
        let drop = s.set_timeout(5.0, "drop");
        s.clear(drop);
        assert_eq!(drain(&mut s, 50.0), vec!["keep"]);
        s.clear(keep);
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn frames_requested_during_drain_wait() {
        let mut s = Scheduler::new(0.0);
        let f = s.request_frame("one");
        s.request_frame("two");
        s.cancel_frame(f);
        let tasks = s.take_frames(16.0);
        assert_eq!(tasks, vec!["two"]);
        s.request_frame("three");
        assert_eq!(s.pending_frames(), 1);
        assert_eq!(s.now(), 16.0);
    }

    #[test]
    fn zero_interval_is_floored() {
        let mut s = Scheduler::new(0.0);
        s.set_interval(0.0, "tick");
        assert_eq!(drain(&mut s, 3.0).len(), 3);
    }
}
