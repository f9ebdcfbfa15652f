//! Minimal observer primitives backing the input bus and the notch model.
//!
//! Both channel kinds live on the UI thread. Notification walks a snapshot of
//! the observer list, so callbacks may subscribe or cancel re-entrantly; an
//! observer cancelled mid-dispatch can still see the in-flight value.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Observers<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
}

impl<T: 'static> Observers<T> {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        })
    }

    fn add(self: &Rc<Self>, callback: Callback<T>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, callback));

        let weak: Weak<Self> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(observers) = weak.upgrade() {
                observers.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Handle to a registered observer. Cancels on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

/// Replace-on-write cell. Observers are told about changes only, never
/// about writes of an equal value, and there is no backlog.
pub struct ValueChannel<T> {
    value: RefCell<T>,
    observers: Rc<Observers<T>>,
}

impl<T: Clone + PartialEq + 'static> ValueChannel<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            observers: Observers::new(),
        }
    }

    #[cfg(test)]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Returns whether the stored value changed.
    pub fn set(&self, value: T) -> bool {
        if *self.value.borrow() == value {
            return false;
        }
        *self.value.borrow_mut() = value.clone();
        self.observers.notify(&value);
        true
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.observers.add(Rc::new(callback))
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

/// One-shot events with no retained value.
pub struct PulseChannel<T> {
    observers: Rc<Observers<T>>,
}

impl<T: 'static> PulseChannel<T> {
    pub fn new() -> Self {
        Self {
            observers: Observers::new(),
        }
    }

    pub fn emit(&self, value: T) {
        self.observers.notify(&value);
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.observers.add(Rc::new(callback))
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

impl<T: 'static> Default for PulseChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_channel_notifies_only_on_change() {
        let channel = ValueChannel::new(false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = channel.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        assert!(channel.set(true));
        assert!(!channel.set(true));
        assert!(channel.set(false));

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(!channel.get());
    }

    #[test]
    fn test_pulse_channel_delivers_every_emit() {
        let channel = PulseChannel::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let _sub = channel.subscribe(move |_: &()| count_clone.set(count_clone.get() + 1));

        channel.emit(());
        channel.emit(());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let channel = PulseChannel::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let sub = channel.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        assert_eq!(channel.subscriber_count(), 1);

        drop(sub);
        channel.emit(7);
        assert_eq!(count.get(), 0);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_are_independent() {
        let channel = PulseChannel::<u32>::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let (a_clone, b_clone) = (Rc::clone(&a), Rc::clone(&b));
        let sub_a = channel.subscribe(move |v| a_clone.set(*v));
        let _sub_b = channel.subscribe(move |v| b_clone.set(*v));

        channel.emit(1);
        sub_a.cancel();
        channel.emit(2);

        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn test_cancel_during_dispatch_is_safe() {
        let channel = Rc::new(PulseChannel::<u32>::new());
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let slot_clone = Rc::clone(&slot);
        let calls_clone = Rc::clone(&calls);
        let sub = channel.subscribe(move |_| {
            calls_clone.set(calls_clone.get() + 1);
            // Cancel ourselves from inside the callback
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        channel.emit(1);
        channel.emit(2);
        assert_eq!(calls.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_channel() {
        let channel = ValueChannel::new(0u32);
        let sub = channel.subscribe(|_| {});
        drop(channel);
        sub.cancel();
    }
}
