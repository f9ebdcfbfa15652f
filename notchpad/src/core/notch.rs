mod geometry;

pub use geometry::NotchGeometry;

use notchpad_ipc::{NotchStatus, OpenReason};

use crate::core::geometry::{Point, Rect};
use crate::effect::Effect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotchState {
    #[default]
    Closed,
    Popping,
    Opened(OpenReason),
}

impl NotchState {
    pub fn status(&self) -> NotchStatus {
        match self {
            NotchState::Closed => NotchStatus::Closed,
            NotchState::Popping => NotchStatus::Popping,
            NotchState::Opened(_) => NotchStatus::Opened,
        }
    }

    pub fn reason(&self) -> Option<OpenReason> {
        match self {
            NotchState::Opened(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self, NotchState::Opened(_))
    }
}

/// Interaction state machine for a single display epoch.
///
/// Every method returns the effects the caller must carry out. Once disposed,
/// every method is a no-op returning no effects.
#[derive(Debug)]
pub struct NotchMachine {
    state: NotchState,
    geometry: NotchGeometry,
    screen_rect: Option<Rect>,
    open_on_hover: bool,
    modifier_held: bool,
    button_held: bool,
    last_pointer: Option<Point>,
    pop_generation: u64,
    disposed: bool,
}

impl NotchMachine {
    pub fn new(geometry: NotchGeometry, open_on_hover: bool) -> Self {
        Self {
            state: NotchState::Closed,
            geometry,
            screen_rect: None,
            open_on_hover,
            modifier_held: false,
            button_held: false,
            last_pointer: None,
            pop_generation: 0,
            disposed: false,
        }
    }

    pub fn state(&self) -> NotchState {
        self.state
    }

    pub fn geometry(&self) -> &NotchGeometry {
        &self.geometry
    }

    pub fn screen_rect(&self) -> Option<Rect> {
        self.screen_rect
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn set_screen_rect(&mut self, rect: Rect) {
        if self.disposed {
            return;
        }
        self.screen_rect = Some(rect);
    }

    /// Opens the panel, overwriting the reason if it is already open.
    pub fn open(&mut self, reason: OpenReason) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.transition(NotchState::Opened(reason))
    }

    pub fn close(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.transition(NotchState::Closed)
    }

    /// Momentary acknowledgement of a drag that has no confirmed payload yet.
    pub fn pop(&mut self) -> Vec<Effect> {
        if self.disposed || self.state != NotchState::Closed {
            return vec![];
        }
        self.transition(NotchState::Popping)
    }

    /// A confirmed drag entered the detector region. An already open panel
    /// keeps its reason so a sticky panel never becomes auto-closing.
    pub fn drag_enter(&mut self) -> Vec<Effect> {
        if self.disposed || self.state.is_opened() {
            return vec![];
        }
        self.transition(NotchState::Opened(OpenReason::Drag))
    }

    /// Only cancels a pop. A drag-opened panel closes through the pointer rule,
    /// since the panel itself extends beyond the detector region.
    pub fn drag_leave(&mut self) -> Vec<Effect> {
        if self.disposed || self.state != NotchState::Popping {
            return vec![];
        }
        self.transition(NotchState::Closed)
    }

    pub fn pop_expired(&mut self, generation: u64) -> Vec<Effect> {
        if self.disposed || self.state != NotchState::Popping || generation != self.pop_generation
        {
            return vec![];
        }
        tracing::debug!("Pop acknowledgement expired");
        self.transition(NotchState::Closed)
    }

    /// A drag-opened panel survives while the pointer is on the panel or
    /// still within the drop-target region around the notch.
    pub fn pointer_moved(&mut self, point: Point) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.last_pointer = Some(point);

        match self.state {
            NotchState::Opened(OpenReason::Drag)
                if !self.geometry.hit_rect().contains(point)
                    && !self.geometry.detector_rect().contains(point) =>
            {
                self.transition(NotchState::Closed)
            }
            NotchState::Closed if self.hover_opens() && self.geometry.hit_rect().contains(point) => {
                self.transition(NotchState::Opened(OpenReason::Click))
            }
            _ => vec![],
        }
    }

    /// Click on the notch opens it; click outside an open panel closes it.
    /// The button then counts as held until released.
    pub fn primary_click(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.button_held = true;
        let Some(point) = self.last_pointer else {
            return vec![];
        };

        match self.state {
            NotchState::Closed | NotchState::Popping
                if self.geometry.device_notch_rect.contains(point) =>
            {
                self.transition(NotchState::Opened(OpenReason::Click))
            }
            NotchState::Opened(_) if !self.geometry.hit_rect().contains(point) => {
                self.transition(NotchState::Closed)
            }
            _ => vec![],
        }
    }

    pub fn primary_released(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.button_held = false;
        vec![]
    }

    /// Pressing the modifier while already hovering the panel region opens it.
    pub fn modifier_changed(&mut self, held: bool) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.modifier_held = held;

        let hovering = self
            .last_pointer
            .is_some_and(|p| self.geometry.hit_rect().contains(p));
        if held && !self.button_held && hovering && self.state == NotchState::Closed {
            return self.transition(NotchState::Opened(OpenReason::Click));
        }
        vec![]
    }

    pub fn dispose(&mut self) -> Vec<Effect> {
        if self.disposed {
            return vec![];
        }
        self.disposed = true;

        if self.state == NotchState::Popping {
            vec![Effect::CancelPopRevert]
        } else {
            vec![]
        }
    }

    /// Hovering never opens during a button-down gesture, so a drag reaching
    /// the notch is left to the drop-target signals.
    fn hover_opens(&self) -> bool {
        !self.button_held && (self.open_on_hover || self.modifier_held)
    }

    fn transition(&mut self, to: NotchState) -> Vec<Effect> {
        let from = self.state;
        if from == to {
            return vec![];
        }

        let mut effects = Vec::new();
        if from == NotchState::Popping {
            effects.push(Effect::CancelPopRevert);
        }

        self.state = to;
        effects.push(Effect::StatusChanged { from, to });

        match to {
            NotchState::Opened(OpenReason::Drag) => effects.push(Effect::Haptic),
            NotchState::Popping => {
                self.pop_generation += 1;
                effects.push(Effect::SchedulePopRevert {
                    generation: self.pop_generation,
                });
            }
            _ => {}
        }

        effects
    }
}
