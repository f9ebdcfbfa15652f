use objc2::runtime::AnyObject;
use objc2::{class, msg_send};
use objc2_app_kit::{NSPasteboard, NSPasteboardNameDrag};

/// NSHapticFeedbackPatternGeneric
const PATTERN_GENERIC: isize = 0;
/// NSHapticFeedbackPerformanceTimeNow
const PERFORMANCE_TIME_NOW: usize = 1;

pub fn perform_haptic_feedback() {
    unsafe {
        let performer: *mut AnyObject = msg_send![class!(NSHapticFeedbackManager), defaultPerformer];
        if performer.is_null() {
            tracing::debug!("No haptic feedback performer available");
            return;
        }
        let _: () = msg_send![
            performer,
            performFeedbackPattern: PATTERN_GENERIC,
            performanceTime: PERFORMANCE_TIME_NOW
        ];
    }
}

/// Change count of the drag pasteboard. AppKit bumps it whenever a drag
/// session writes its payload.
pub fn drag_pasteboard_change_count() -> isize {
    unsafe {
        let pasteboard = NSPasteboard::pasteboardWithName(NSPasteboardNameDrag);
        pasteboard.changeCount()
    }
}
