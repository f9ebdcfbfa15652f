use core_graphics::display::CGDisplay;
use objc2::rc::Retained;
use objc2::{define_class, msg_send, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{
    NSBackingStoreType, NSColor, NSWindow, NSWindowCollectionBehavior, NSWindowStyleMask,
};
use objc2_foundation::{NSPoint, NSRect, NSSize};

use crate::core::Rect;
use crate::platform::{OverlayWindow, WindowSpec};

// Borderless windows refuse key status unless the subclass opts in
define_class!(
    #[unsafe(super(NSWindow))]
    #[thread_kind = MainThreadOnly]
    #[name = "NotchpadOverlayWindow"]
    struct OverlayNSWindow;

    impl OverlayNSWindow {
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key_window(&self) -> bool {
            true
        }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main_window(&self) -> bool {
            false
        }
    }
);

impl OverlayNSWindow {
    fn new(mtm: MainThreadMarker, frame: NSRect) -> Retained<Self> {
        unsafe {
            msg_send![
                Self::alloc(mtm),
                initWithContentRect: frame,
                styleMask: NSWindowStyleMask::Borderless,
                backing: NSBackingStoreType::Buffered,
                defer: false
            ]
        }
    }
}

/// Transparent always-on-top host window covering the notch area.
pub struct NotchWindow {
    window: Retained<NSWindow>,
}

impl NotchWindow {
    pub fn new(mtm: MainThreadMarker, spec: &WindowSpec) -> Self {
        let frame = to_cocoa_frame(spec.frame);
        tracing::debug!(
            "Creating overlay window at ({}, {}) size {}x{}",
            frame.origin.x,
            frame.origin.y,
            frame.size.width,
            frame.size.height
        );

        let window: Retained<NSWindow> =
            unsafe { Retained::cast_unchecked(OverlayNSWindow::new(mtm, frame)) };

        window.setLevel(spec.level);
        window.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::Stationary
                | NSWindowCollectionBehavior::FullScreenAuxiliary
                | NSWindowCollectionBehavior::IgnoresCycle,
        );

        window.setOpaque(false);
        window.setHasShadow(false);
        let clear_color = NSColor::clearColor();
        window.setBackgroundColor(Some(&clear_color));

        window.setMovable(false);
        window.setExcludedFromWindowsMenu(true);
        window.setIgnoresMouseEvents(false);
        window.setAcceptsMouseMovedEvents(true);
        // The controller keeps its own reference and closes exactly once
        unsafe { window.setReleasedWhenClosed(false) };

        Self { window }
    }
}

impl OverlayWindow for NotchWindow {
    fn show(&self) {
        self.window.orderFrontRegardless();
    }

    fn bring_to_front_as_key(&self) {
        self.window.makeKeyAndOrderFront(None);
        self.window.orderFrontRegardless();
    }

    fn close(&self) {
        self.window.orderOut(None);
        self.window.close();
    }
}

/// Cocoa frames grow upward from the bottom-left of the main display.
fn to_cocoa_frame(frame: Rect) -> NSRect {
    let main_height = CGDisplay::main().bounds().size.height;
    NSRect::new(
        NSPoint::new(frame.x, main_height - frame.max_y()),
        NSSize::new(frame.width, frame.height),
    )
}
