use crate::core::config::Config;
use crate::core::display::{device_notch_rect, resolve_cutout, DisplayCutout, DisplayInfo};
use crate::core::geometry::{Rect, Size};

use super::NotchState;

/// Per-display geometry of the notch panel, fixed for one display epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct NotchGeometry {
    pub cutout: DisplayCutout,
    pub device_notch_rect: Rect,
    pub opened_size: Size,
    pub closed_margin: f64,
    pub pop_margin: f64,
    pub closed_radius: f64,
    pub popping_radius: f64,
    pub opened_radius: f64,
    pub spacing: f64,
    pub inset: f64,
    pub detector_margin: f64,
}

impl NotchGeometry {
    pub fn new(display: &DisplayInfo, config: &Config) -> Self {
        let cutout = resolve_cutout(display);
        Self {
            cutout,
            device_notch_rect: device_notch_rect(display, &cutout),
            opened_size: config.opened_size(),
            closed_margin: config.closed_margin,
            pop_margin: config.pop_margin,
            closed_radius: config.closed_radius,
            popping_radius: config.popping_radius,
            opened_radius: config.opened_radius,
            spacing: config.spacing,
            inset: config.inset_for(&cutout),
            detector_margin: config.detector_margin,
        }
    }

    pub fn size_for(&self, state: NotchState) -> Size {
        match state {
            NotchState::Closed => self.device_notch_rect.size().inflated(-self.closed_margin),
            NotchState::Popping => self.device_notch_rect.size().inflated(self.pop_margin),
            NotchState::Opened(_) => self.opened_size,
        }
    }

    pub fn corner_radius_for(&self, state: NotchState) -> f64 {
        match state {
            NotchState::Closed => self.closed_radius,
            NotchState::Popping => self.popping_radius,
            NotchState::Opened(_) => self.opened_radius,
        }
    }

    pub fn opened_rect(&self) -> Rect {
        Rect::centered_at_top(
            self.device_notch_rect.mid_x(),
            self.device_notch_rect.y,
            self.opened_size,
        )
    }

    /// Opened rect grown or shrunk by the signed inset. Hovering it opens a
    /// closed panel and leaving it closes a drag-opened one.
    pub fn hit_rect(&self) -> Rect {
        self.opened_rect().expanded(self.inset)
    }

    pub fn detector_rect(&self) -> Rect {
        self.device_notch_rect.expanded(self.detector_margin)
    }

    pub fn tallest_height(&self) -> f64 {
        [
            NotchState::Closed,
            NotchState::Popping,
            NotchState::Opened(notchpad_ipc::OpenReason::Click),
        ]
        .into_iter()
        .map(|state| self.size_for(state).height)
        .fold(0.0, f64::max)
    }
}
