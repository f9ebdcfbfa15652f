use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use notchpad_ipc::{NotchStatus, OpenReason};

use crate::core::{Config, NotchGeometry, NotchMachine, NotchState, Point, Rect};
use crate::effect::Effect;
use crate::input::{InputBus, PulseChannel, Subscription, ValueChannel};
use crate::scheduler::{Scheduler, TaskId};

use super::effects::execute_effects;

/// Runtime wrapper around [`NotchMachine`]: feeds it from the input bus,
/// carries out its effects and republishes its state.
pub struct NotchModel {
    pub(super) machine: RefCell<NotchMachine>,
    pub(super) scheduler: Rc<dyn Scheduler>,
    pub(super) pop_duration: Duration,
    pub(super) pop_revert: Cell<Option<TaskId>>,
    pub(super) status: ValueChannel<NotchState>,
    pub(super) haptic: PulseChannel<()>,
    pub(super) weak_self: Weak<NotchModel>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl NotchModel {
    pub fn new(
        geometry: NotchGeometry,
        config: &Config,
        bus: &InputBus,
        scheduler: Rc<dyn Scheduler>,
    ) -> Rc<Self> {
        let model = Rc::new_cyclic(|weak_self| Self {
            machine: RefCell::new(NotchMachine::new(geometry, config.open_on_hover)),
            scheduler,
            pop_duration: config.pop_duration(),
            pop_revert: Cell::new(None),
            status: ValueChannel::new(NotchState::Closed),
            haptic: PulseChannel::new(),
            weak_self: weak_self.clone(),
            subscriptions: RefCell::new(Vec::new()),
        });
        model.attach(bus);
        model
    }

    fn attach(self: &Rc<Self>, bus: &InputBus) {
        let mut subscriptions = self.subscriptions.borrow_mut();

        let weak = Rc::downgrade(self);
        subscriptions.push(bus.pointer_location().subscribe(move |point| {
            if let (Some(model), Some(point)) = (weak.upgrade(), point) {
                model.pointer_moved(*point);
            }
        }));

        let weak = Rc::downgrade(self);
        subscriptions.push(bus.primary_click().subscribe(move |_| {
            if let Some(model) = weak.upgrade() {
                model.primary_click();
            }
        }));

        let weak = Rc::downgrade(self);
        subscriptions.push(bus.primary_release().subscribe(move |_| {
            if let Some(model) = weak.upgrade() {
                model.primary_released();
            }
        }));

        let weak = Rc::downgrade(self);
        subscriptions.push(bus.modifier_key().subscribe(move |held| {
            if let Some(model) = weak.upgrade() {
                model.modifier_changed(*held);
            }
        }));
    }

    pub fn state(&self) -> NotchState {
        self.machine.borrow().state()
    }

    pub fn geometry(&self) -> NotchGeometry {
        self.machine.borrow().geometry().clone()
    }

    pub fn screen_rect(&self) -> Option<Rect> {
        self.machine.borrow().screen_rect()
    }

    pub fn status(&self) -> NotchStatus {
        self.state().status()
    }

    /// Why the panel is open, `None` unless opened.
    pub fn reason(&self) -> Option<OpenReason> {
        self.state().reason()
    }

    pub fn device_notch_rect(&self) -> Rect {
        self.machine.borrow().geometry().device_notch_rect
    }

    /// Outline of the notch shape for the current state, hanging from the
    /// top edge of the display.
    pub fn shape_rect(&self) -> Rect {
        let machine = self.machine.borrow();
        let geometry = machine.geometry();
        Rect::centered_at_top(
            geometry.device_notch_rect.mid_x(),
            geometry.device_notch_rect.y,
            geometry.size_for(machine.state()),
        )
    }

    pub fn corner_radius(&self) -> f64 {
        let machine = self.machine.borrow();
        machine.geometry().corner_radius_for(machine.state())
    }

    pub fn has_cutout(&self) -> bool {
        self.machine.borrow().geometry().cutout.has_cutout
    }

    /// Signed hit-test tolerance around the opened rect. Negative on real
    /// cutouts, so the hit region is tighter than the drawn panel.
    pub fn inset(&self) -> f64 {
        self.machine.borrow().geometry().inset
    }

    pub fn spacing(&self) -> f64 {
        self.machine.borrow().geometry().spacing
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.machine.borrow().is_disposed()
    }

    #[cfg(test)]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Current state with change notifications.
    pub fn status_changes(&self) -> &ValueChannel<NotchState> {
        &self.status
    }

    /// Fires once per drop-intent open.
    pub fn haptic(&self) -> &PulseChannel<()> {
        &self.haptic
    }

    pub fn set_screen_rect(&self, rect: Rect) {
        self.machine.borrow_mut().set_screen_rect(rect);
    }

    pub fn open(&self, reason: OpenReason) {
        self.apply(|m| m.open(reason));
    }

    pub fn close(&self) {
        self.apply(|m| m.close());
    }

    pub fn pop(&self) {
        self.apply(|m| m.pop());
    }

    pub fn drag_enter(&self) {
        self.apply(|m| m.drag_enter());
    }

    pub fn drag_leave(&self) {
        self.apply(|m| m.drag_leave());
    }

    pub(super) fn pop_expired(&self, generation: u64) {
        self.apply(|m| m.pop_expired(generation));
    }

    fn pointer_moved(&self, point: Point) {
        self.apply(|m| m.pointer_moved(point));
    }

    fn primary_click(&self) {
        self.apply(|m| m.primary_click());
    }

    fn primary_released(&self) {
        self.apply(|m| m.primary_released());
    }

    fn modifier_changed(&self, held: bool) {
        self.apply(|m| m.modifier_changed(held));
    }

    /// Unsubscribes from the bus and turns every later call into a no-op.
    pub fn dispose(&self) {
        let effects = self.machine.borrow_mut().dispose();
        // Dropping cancels each subscription
        let subscriptions: Vec<Subscription> = self.subscriptions.borrow_mut().drain(..).collect();
        drop(subscriptions);
        execute_effects(self, effects);
        tracing::debug!("Notch model disposed");
    }

    fn apply(&self, transition: impl FnOnce(&mut NotchMachine) -> Vec<Effect>) {
        let effects = {
            let mut machine = self.machine.borrow_mut();
            transition(&mut machine)
        };
        execute_effects(self, effects);
    }
}
