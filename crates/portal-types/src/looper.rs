//! Single-threaded main looper.
//!
//! Any thread may post through a [`MainHandle`]; only the owner of the
//! [`Looper`] drains it. Delayed tasks live on the looper side so they can
//! be cancelled when the screen is torn down.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::event::ShellEvent;

/// Identifies a delayed task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Delayed {
    id: TaskId,
    due: Instant,
    event: ShellEvent,
}

/// Cloneable, `Send` handle for posting events to the main looper.
#[derive(Debug, Clone)]
pub struct MainHandle {
    tx: Sender<ShellEvent>,
}

impl MainHandle {
    /// Post an event. Returns `false` if the looper has been dropped.
    pub fn post(&self, event: ShellEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// The main event queue.
#[derive(Debug)]
pub struct Looper {
    tx: Sender<ShellEvent>,
    rx: Receiver<ShellEvent>,
    delayed: Vec<Delayed>,
    next_id: u64,
}

impl Looper {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            delayed: Vec::new(),
            next_id: 0,
        }
    }

    /// A handle other threads can post through.
    pub fn handle(&self) -> MainHandle {
        MainHandle {
            tx: self.tx.clone(),
        }
    }

    /// Post an event from the looper thread itself.
    pub fn post(&self, event: ShellEvent) {
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.tx.send(event);
    }

    /// Schedule `event` to be delivered at `due`.
    pub fn post_at(&mut self, event: ShellEvent, due: Instant) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.delayed.push(Delayed { id, due, event });
        id
    }

    /// Schedule `event` to be delivered after `delay`.
    pub fn post_delayed(&mut self, event: ShellEvent, delay: Duration) -> TaskId {
        self.post_at(event, Instant::now() + delay)
    }

    /// Cancel a delayed task. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.delayed.len();
        self.delayed.retain(|d| d.id != id);
        self.delayed.len() != before
    }

    /// Drop every pending delayed task.
    pub fn cancel_all(&mut self) {
        if !self.delayed.is_empty() {
            log::debug!("Cancelling {} delayed task(s)", self.delayed.len());
        }
        self.delayed.clear();
    }

    /// Number of delayed tasks not yet delivered.
    pub fn pending_delayed(&self) -> usize {
        self.delayed.len()
    }

    /// Next event that is ready at `now`, without blocking.
    ///
    /// Due delayed tasks are delivered before posted events, earliest first.
    pub fn poll(&mut self, now: Instant) -> Option<ShellEvent> {
        if let Some(event) = self.take_due(now) {
            return Some(event);
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until an event is ready or `timeout` elapses.
    ///
    /// The wait is shortened to the next delayed task's deadline.
    pub fn wait(&mut self, timeout: Duration) -> Option<ShellEvent> {
        let now = Instant::now();
        if let Some(event) = self.poll(now) {
            return Some(event);
        }
        let wait = self
            .next_deadline()
            .map(|due| due.saturating_duration_since(now).min(timeout))
            .unwrap_or(timeout);
        match self.rx.recv_timeout(wait) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                self.take_due(Instant::now())
            },
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.delayed.iter().map(|d| d.due).min()
    }

    fn take_due(&mut self, now: Instant) -> Option<ShellEvent> {
        let idx = self
            .delayed
            .iter()
            .enumerate()
            .filter(|(_, d)| d.due <= now)
            .min_by_key(|(_, d)| d.due)
            .map(|(i, _)| i)?;
        Some(self.delayed.remove(idx).event)
    }
}

impl Default for Looper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posted_events_arrive_in_order() {
        let mut looper = Looper::new();
        looper.post(ShellEvent::NetworkLost);
        looper.post(ShellEvent::NetworkAvailable);
        let now = Instant::now();
        assert_eq!(looper.poll(now), Some(ShellEvent::NetworkLost));
        assert_eq!(looper.poll(now), Some(ShellEvent::NetworkAvailable));
        assert_eq!(looper.poll(now), None);
    }

    #[test]
    fn handle_posts_from_another_thread() {
        let mut looper = Looper::new();
        let handle = looper.handle();
        std::thread::spawn(move || {
            assert!(handle.post(ShellEvent::RefreshGesture));
        })
        .join()
        .unwrap();
        assert_eq!(looper.poll(Instant::now()), Some(ShellEvent::RefreshGesture));
    }

    #[test]
    fn handle_reports_dropped_looper() {
        let looper = Looper::new();
        let handle = looper.handle();
        drop(looper);
        assert!(!handle.post(ShellEvent::Quit));
    }

    #[test]
    fn delayed_event_waits_for_deadline() {
        let mut looper = Looper::new();
        let start = Instant::now();
        looper.post_at(ShellEvent::HideProgress, start + Duration::from_millis(200));
        assert_eq!(looper.poll(start), None);
        assert_eq!(looper.pending_delayed(), 1);
        assert_eq!(
            looper.poll(start + Duration::from_millis(200)),
            Some(ShellEvent::HideProgress)
        );
        assert_eq!(looper.pending_delayed(), 0);
    }

    #[test]
    fn due_delayed_events_come_earliest_first() {
        let mut looper = Looper::new();
        let start = Instant::now();
        looper.post_at(ShellEvent::Resume, start + Duration::from_millis(20));
        looper.post_at(ShellEvent::Pause, start + Duration::from_millis(10));
        let later = start + Duration::from_millis(50);
        assert_eq!(looper.poll(later), Some(ShellEvent::Pause));
        assert_eq!(looper.poll(later), Some(ShellEvent::Resume));
    }

    #[test]
    fn cancel_removes_single_task() {
        let mut looper = Looper::new();
        let start = Instant::now();
        let id = looper.post_at(ShellEvent::HideProgress, start);
        assert!(looper.cancel(id));
        assert!(!looper.cancel(id));
        assert_eq!(looper.poll(start), None);
    }

    #[test]
    fn cancel_all_drops_pending_tasks() {
        let mut looper = Looper::new();
        looper.post_delayed(ShellEvent::HideProgress, Duration::from_millis(1));
        looper.post_delayed(ShellEvent::HideProgress, Duration::from_millis(2));
        looper.cancel_all();
        assert_eq!(looper.pending_delayed(), 0);
        assert_eq!(looper.poll(Instant::now() + Duration::from_secs(1)), None);
    }

    #[test]
    fn wait_returns_delayed_event_after_deadline() {
        let mut looper = Looper::new();
        looper.post_delayed(ShellEvent::HideProgress, Duration::from_millis(5));
        let event = looper.wait(Duration::from_secs(1));
        assert_eq!(event, Some(ShellEvent::HideProgress));
    }

    #[test]
    fn wait_times_out_when_idle() {
        let mut looper = Looper::new();
        assert_eq!(looper.wait(Duration::from_millis(5)), None);
    }
}
