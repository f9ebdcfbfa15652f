use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Deferred work on the UI thread.
/// This abstraction allows driving time deterministically in tests.
pub trait Scheduler {
    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskId;
    fn schedule_repeating(&self, interval: Duration, task: Box<dyn FnMut()>) -> TaskId;
    fn cancel(&self, id: TaskId);
}

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeating {
        interval: Duration,
        task: Box<dyn FnMut()>,
    },
}

struct Entry {
    id: TaskId,
    due: Instant,
    task: Task,
}

/// Timer queue polled from the main run loop tick.
///
/// Delays are measured from the instant of the last [`TimerQueue::run_due`]
/// call, which in production is at most one tick old.
pub struct TimerQueue {
    now: Cell<Instant>,
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
    running: Cell<Option<TaskId>>,
    running_cancelled: Cell<bool>,
}

const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl TimerQueue {
    pub fn new(now: Instant) -> Self {
        Self {
            now: Cell::new(now),
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
            running: Cell::new(None),
            running_cancelled: Cell::new(false),
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Runs every task due at or before `now`, earliest first. Tasks may
    /// schedule or cancel other tasks while running. Returns how many ran.
    pub fn run_due(&self, now: Instant) -> usize {
        self.now.set(now);
        let mut ran = 0;

        while let Some(entry) = self.take_next_due(now) {
            ran += 1;
            match entry.task {
                Task::Once(task) => task(),
                Task::Repeating { interval, mut task } => {
                    self.running.set(Some(entry.id));
                    self.running_cancelled.set(false);
                    task();
                    self.running.set(None);

                    if !self.running_cancelled.get() {
                        self.entries.borrow_mut().push(Entry {
                            id: entry.id,
                            due: entry.due + interval,
                            task: Task::Repeating { interval, task },
                        });
                    }
                }
            }
        }

        ran
    }

    /// Moves the clock forward by `by` and runs what became due.
    pub fn advance(&self, by: Duration) -> usize {
        self.run_due(self.now.get() + by)
    }

    fn take_next_due(&self, now: Instant) -> Option<Entry> {
        let mut entries = self.entries.borrow_mut();
        let index = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= now)
            .min_by_key(|(_, entry)| (entry.due, entry.id.0))
            .map(|(index, _)| index)?;
        Some(entries.remove(index))
    }

    fn push(&self, due: Instant, task: Task) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry { id, due, task });
        id
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskId {
        self.push(self.now.get() + delay, Task::Once(task))
    }

    fn schedule_repeating(&self, interval: Duration, task: Box<dyn FnMut()>) -> TaskId {
        let interval = interval.max(MIN_INTERVAL);
        self.push(self.now.get() + interval, Task::Repeating { interval, task })
    }

    fn cancel(&self, id: TaskId) {
        if self.running.get() == Some(id) {
            self.running_cancelled.set(true);
        }
        self.entries.borrow_mut().retain(|entry| entry.id != id);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        (Rc::clone(&count), count)
    }

    #[test]
    fn test_once_runs_after_delay() {
        let queue = TimerQueue::new(Instant::now());
        let (count, handle) = counter();
        queue.schedule_once(
            Duration::from_millis(100),
            Box::new(move || handle.set(handle.get() + 1)),
        );

        assert_eq!(queue.advance(Duration::from_millis(99)), 0);
        assert_eq!(queue.advance(Duration::from_millis(1)), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let queue = TimerQueue::new(Instant::now());
        let (count, handle) = counter();
        let id = queue.schedule_once(
            Duration::from_millis(10),
            Box::new(move || handle.set(handle.get() + 1)),
        );
        queue.cancel(id);

        queue.advance(Duration::from_secs(1));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_repeating_runs_each_interval() {
        let queue = TimerQueue::new(Instant::now());
        let (count, handle) = counter();
        queue.schedule_repeating(
            Duration::from_millis(500),
            Box::new(move || handle.set(handle.get() + 1)),
        );

        queue.advance(Duration::from_millis(499));
        assert_eq!(count.get(), 0);
        queue.advance(Duration::from_millis(1));
        assert_eq!(count.get(), 1);
        queue.advance(Duration::from_millis(1000));
        assert_eq!(count.get(), 3);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_repeating_can_cancel_itself() {
        let queue = Rc::new(TimerQueue::new(Instant::now()));
        let (count, handle) = counter();
        let id_slot: Rc<Cell<Option<TaskId>>> = Rc::new(Cell::new(None));

        let queue_clone = Rc::clone(&queue);
        let id_clone = Rc::clone(&id_slot);
        let id = queue.schedule_repeating(
            Duration::from_millis(10),
            Box::new(move || {
                handle.set(handle.get() + 1);
                if handle.get() == 2 {
                    if let Some(id) = id_clone.get() {
                        queue_clone.cancel(id);
                    }
                }
            }),
        );
        id_slot.set(Some(id));

        queue.advance(Duration::from_millis(100));
        assert_eq!(count.get(), 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let queue = TimerQueue::new(Instant::now());
        let order = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let order = Rc::clone(&order);
            queue.schedule_once(
                Duration::from_millis(delay),
                Box::new(move || order.borrow_mut().push(label)),
            );
        }

        queue.advance(Duration::from_millis(50));
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_task_scheduled_while_running_waits_for_its_delay() {
        let queue = Rc::new(TimerQueue::new(Instant::now()));
        let (count, handle) = counter();

        let queue_clone = Rc::clone(&queue);
        queue.schedule_once(
            Duration::from_millis(10),
            Box::new(move || {
                queue_clone.schedule_once(
                    Duration::from_millis(10),
                    Box::new(move || handle.set(handle.get() + 1)),
                );
            }),
        );

        queue.advance(Duration::from_millis(10));
        assert_eq!(count.get(), 0);
        queue.advance(Duration::from_millis(10));
        assert_eq!(count.get(), 1);
    }
}
