use std::collections::HashSet;

use crate::core::Point;

use super::channel::{PulseChannel, ValueChannel};
use super::event::{input_queue, InputEvent, InputQueue, InputSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    Pointer,
    Click,
    Drag,
    Modifier,
}

impl InputChannel {
    pub const ALL: [InputChannel; 4] = [
        InputChannel::Pointer,
        InputChannel::Click,
        InputChannel::Drag,
        InputChannel::Modifier,
    ];
}

/// Installs the system-wide hooks that feed the bus.
/// This abstraction allows substituting a fake source in tests.
pub trait InputSource {
    /// Installs one hook per channel. Hook callbacks may only enqueue into
    /// `sender`. Returns the outcome for every channel that was attempted.
    fn install(&mut self, sender: InputSender) -> Vec<(InputChannel, Result<(), String>)>;
}

/// Single owner of the system input hooks for the process.
///
/// Hook callbacks run on the input thread and only enqueue; [`InputBus::pump`]
/// republishes on the UI thread in arrival order.
pub struct InputBus {
    pointer: ValueChannel<Option<Point>>,
    click: PulseChannel<()>,
    release: PulseChannel<()>,
    drag: PulseChannel<Point>,
    modifier: ValueChannel<bool>,
    queue: InputQueue,
    live: HashSet<InputChannel>,
}

impl InputBus {
    pub fn new(source: &mut dyn InputSource) -> Self {
        let (sender, queue) = input_queue();

        let mut live = HashSet::new();
        for (channel, result) in source.install(sender) {
            match result {
                Ok(()) => {
                    tracing::debug!("Input hook for {:?} installed", channel);
                    live.insert(channel);
                }
                Err(e) => {
                    tracing::warn!("Input hook for {:?} unavailable, channel stays inert: {}", channel, e);
                }
            }
        }

        Self {
            pointer: ValueChannel::new(None),
            click: PulseChannel::new(),
            release: PulseChannel::new(),
            drag: PulseChannel::new(),
            modifier: ValueChannel::new(false),
            queue,
            live,
        }
    }

    pub fn pointer_location(&self) -> &ValueChannel<Option<Point>> {
        &self.pointer
    }

    pub fn primary_click(&self) -> &PulseChannel<()> {
        &self.click
    }

    /// Published on the same hook as [`InputBus::primary_click`].
    pub fn primary_release(&self) -> &PulseChannel<()> {
        &self.release
    }

    pub fn drag_movement(&self) -> &PulseChannel<Point> {
        &self.drag
    }

    pub fn modifier_key(&self) -> &ValueChannel<bool> {
        &self.modifier
    }

    pub fn is_live(&self, channel: InputChannel) -> bool {
        self.live.contains(&channel)
    }

    /// Publishes everything queued since the last pump. Returns the number of
    /// events delivered.
    pub fn pump(&self) -> usize {
        let events = self.queue.drain();
        let count = events.len();
        for event in events {
            self.publish(event);
        }
        count
    }

    fn publish(&self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved(point) => {
                self.pointer.set(Some(point));
            }
            InputEvent::PrimaryClick => self.click.emit(()),
            InputEvent::PrimaryReleased => self.release.emit(()),
            InputEvent::DragMoved(point) => self.drag.emit(point),
            InputEvent::ModifierChanged(held) => {
                self.modifier.set(held);
            }
        }
    }
}
