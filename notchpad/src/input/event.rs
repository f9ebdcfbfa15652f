use std::sync::mpsc;

use crate::core::Point;

/// Raw input observed by a system hook, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved(Point),
    PrimaryClick,
    PrimaryReleased,
    DragMoved(Point),
    ModifierChanged(bool),
}

/// Sending half handed to hook callbacks. Never blocks.
#[derive(Clone)]
pub struct InputSender {
    tx: mpsc::Sender<InputEvent>,
}

impl InputSender {
    pub fn send(&self, event: InputEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Input queue closed, dropping {:?}", event);
        }
    }
}

/// Receiving half, drained on the UI thread.
pub struct InputQueue {
    rx: mpsc::Receiver<InputEvent>,
}

pub fn input_queue() -> (InputSender, InputQueue) {
    let (tx, rx) = mpsc::channel();
    (InputSender { tx }, InputQueue { rx })
}

impl InputQueue {
    /// Takes every pending event in arrival order. Runs of consecutive pointer
    /// moves collapse to the latest one; nothing is merged across other events.
    pub fn drain(&self) -> Vec<InputEvent> {
        let mut events: Vec<InputEvent> = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            let supersedes_last = matches!(
                (events.last(), event),
                (Some(InputEvent::PointerMoved(_)), InputEvent::PointerMoved(_))
            );
            if supersedes_last {
                events.pop();
            }
            events.push(event);
        }
        events
    }
}
