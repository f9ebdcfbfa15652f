//! Cutout detection and display selection.
//!
//! Everything here is derived from a [`DisplayInfo`] snapshot and must be
//! recomputed whenever the display configuration changes.

use super::geometry::{Rect, Size};

pub type DisplayId = u32;

/// Size used in place of a physical cutout on displays without one.
pub const SYNTHETIC_CUTOUT_WIDTH: f64 = 150.0;
pub const SYNTHETIC_CUTOUT_HEIGHT: f64 = 28.0;

/// Snapshot of a display as reported by the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub name: String,
    /// Full display bounds in global top-left-origin coordinates.
    pub frame: Rect,
    pub is_main: bool,
    pub is_builtin: bool,
    /// Top safe-area inset. Positive only on displays with a camera housing.
    pub safe_area_top: f64,
    /// Width of the system UI strip left of the cutout, if it could be measured.
    pub aux_left_width: Option<f64>,
    /// Width of the system UI strip right of the cutout, if it could be measured.
    pub aux_right_width: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayCutout {
    pub has_cutout: bool,
    pub width: f64,
    pub height: f64,
}

impl DisplayCutout {
    pub const NONE: Self = Self {
        has_cutout: false,
        width: 0.0,
        height: 0.0,
    };

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

pub fn resolve_cutout(display: &DisplayInfo) -> DisplayCutout {
    if display.safe_area_top <= 0.0 {
        return DisplayCutout::NONE;
    }

    // A genuine cutout always has measurable system UI on both sides.
    let (Some(left), Some(right)) = (display.aux_left_width, display.aux_right_width) else {
        return DisplayCutout::NONE;
    };
    if left <= 0.0 || right <= 0.0 {
        return DisplayCutout::NONE;
    }

    let width = display.frame.width - left - right;
    if width <= 0.0 {
        let display_id = display.id;
        tracing::debug!(
            "Display {} reports auxiliary areas wider than the screen, ignoring cutout",
            display_id
        );
        return DisplayCutout::NONE;
    }

    DisplayCutout {
        has_cutout: true,
        width,
        height: display.safe_area_top,
    }
}

pub fn synthetic_cutout() -> DisplayCutout {
    DisplayCutout {
        has_cutout: false,
        width: SYNTHETIC_CUTOUT_WIDTH,
        height: SYNTHETIC_CUTOUT_HEIGHT,
    }
}

/// Built-in display with a real cutout, else the main display, else whatever comes first.
pub fn preferred_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays
        .iter()
        .find(|d| d.is_builtin && resolve_cutout(d).has_cutout)
        .or_else(|| displays.iter().find(|d| d.is_main))
        .or_else(|| displays.first())
}

/// Absolute rect of the cutout, or of the synthetic stand-in, centered and
/// flush with the top edge of `display`.
pub fn device_notch_rect(display: &DisplayInfo, cutout: &DisplayCutout) -> Rect {
    let size = if cutout.has_cutout {
        cutout.size()
    } else {
        synthetic_cutout().size()
    };
    Rect::centered_at_top(display.frame.mid_x(), display.frame.y, size)
}
