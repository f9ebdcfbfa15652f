use crate::core::{DisplayInfo, Rect};

/// NSStatusWindowLevel. The overlay sits a few levels above the status bar
/// and well below pop-up menus and system alerts.
pub const STATUS_WINDOW_LEVEL: isize = 25;
pub const OVERLAY_WINDOW_LEVEL: isize = STATUS_WINDOW_LEVEL + 8;

/// Trait for querying display information from the system.
/// This abstraction allows mocking in tests.
pub trait DisplaySystem {
    fn get_all_displays(&self) -> Vec<DisplayInfo>;
}

/// Everything needed to create the overlay window.
///
/// The window is always borderless, transparent, key-capable, present on every
/// space and full-screen context, hidden from app switchers and not movable.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    /// Global top-left-origin coordinates.
    pub frame: Rect,
    pub level: isize,
}

impl WindowSpec {
    pub fn overlay(frame: Rect) -> Self {
        Self {
            frame,
            level: OVERLAY_WINDOW_LEVEL,
        }
    }
}

pub trait OverlayWindow {
    fn show(&self);
    fn bring_to_front_as_key(&self);
    fn close(&self);
}

pub trait WindowFactory {
    fn create_window(&self, spec: &WindowSpec) -> Box<dyn OverlayWindow>;
}

pub trait HapticFeedback {
    fn perform(&self);
}

/// Observes the system drag pasteboard. Its change count moves when a drag
/// carrying data begins.
pub trait DragProbe {
    fn change_count(&self) -> i64;
}

#[cfg(target_os = "macos")]
pub use self::macos_impl::*;

#[cfg(target_os = "macos")]
mod macos_impl {
    use objc2::MainThreadMarker;

    use super::*;

    /// macOS implementation of DisplaySystem
    #[derive(Default)]
    pub struct MacOSDisplaySystem;

    impl DisplaySystem for MacOSDisplaySystem {
        fn get_all_displays(&self) -> Vec<DisplayInfo> {
            crate::macos::get_all_displays()
        }
    }

    /// macOS implementation of WindowFactory
    pub struct MacOSWindowFactory {
        mtm: MainThreadMarker,
    }

    impl MacOSWindowFactory {
        pub fn new(mtm: MainThreadMarker) -> Self {
            Self { mtm }
        }
    }

    impl WindowFactory for MacOSWindowFactory {
        fn create_window(&self, spec: &WindowSpec) -> Box<dyn OverlayWindow> {
            Box::new(crate::macos::NotchWindow::new(self.mtm, spec))
        }
    }

    #[derive(Default)]
    pub struct MacOSHapticFeedback;

    impl HapticFeedback for MacOSHapticFeedback {
        fn perform(&self) {
            crate::macos::perform_haptic_feedback();
        }
    }

    #[derive(Default)]
    pub struct MacOSDragProbe;

    impl DragProbe for MacOSDragProbe {
        fn change_count(&self) -> i64 {
            crate::macos::drag_pasteboard_change_count() as i64
        }
    }
}
