use std::ffi::c_void;
use std::sync::mpsc::Sender;
use std::sync::OnceLock;

use core_graphics::display::{CGDirectDisplayID, CGDisplay};
use objc2::{msg_send, sel, MainThreadMarker};
use objc2_app_kit::NSScreen;
use objc2_foundation::{NSEdgeInsets, NSNumber, NSRect};

use crate::core::{DisplayId, DisplayInfo, Rect};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGDisplayRegisterReconfigurationCallback(
        callback: unsafe extern "C" fn(CGDirectDisplayID, u32, *mut c_void),
        user_info: *mut c_void,
    ) -> i32;
}

#[derive(Debug, Clone)]
pub struct DisplayReconfigEvent {
    pub display_id: DisplayId,
    pub flags: u32,
}

static DISPLAY_RECONFIG_TX: OnceLock<Sender<DisplayReconfigEvent>> = OnceLock::new();

extern "C" fn display_reconfig_callback(
    display_id: CGDirectDisplayID,
    flags: u32,
    _user_info: *mut c_void,
) {
    if let Some(tx) = DISPLAY_RECONFIG_TX.get() {
        let _ = tx.send(DisplayReconfigEvent { display_id, flags });
    }
}

pub fn register_display_callback(tx: Sender<DisplayReconfigEvent>) -> anyhow::Result<()> {
    DISPLAY_RECONFIG_TX
        .set(tx)
        .map_err(|_| anyhow::anyhow!("Display callback already registered"))?;

    let result = unsafe {
        CGDisplayRegisterReconfigurationCallback(display_reconfig_callback, std::ptr::null_mut())
    };

    if result != 0 {
        anyhow::bail!("Failed to register display callback: {}", result);
    }

    tracing::info!("Display reconfiguration callback registered");
    Ok(())
}

/// Enumerates connected screens. Frames are global top-left-origin
/// coordinates from CGDisplayBounds; the cutout measurements come from
/// NSScreen, which only knows about them on macOS 12 and later.
pub fn get_all_displays() -> Vec<DisplayInfo> {
    // Display enumeration runs on the main thread tick only
    let mtm = unsafe { MainThreadMarker::new_unchecked() };
    let main_display_id = CGDisplay::main().id;

    NSScreen::screens(mtm)
        .iter()
        .filter_map(|screen| {
            let id = get_display_id_for_screen(&screen)?;
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            let (safe_area_top, aux_left_width, aux_right_width) = read_cutout_metrics(&screen);

            Some(DisplayInfo {
                id,
                name: screen.localizedName().to_string(),
                frame: Rect::new(
                    bounds.origin.x,
                    bounds.origin.y,
                    bounds.size.width,
                    bounds.size.height,
                ),
                is_main: id == main_display_id,
                is_builtin: display.is_builtin(),
                safe_area_top,
                aux_left_width,
                aux_right_width,
            })
        })
        .collect()
}

fn get_display_id_for_screen(screen: &NSScreen) -> Option<DisplayId> {
    let desc = screen.deviceDescription();
    let key = objc2_foundation::ns_string!("NSScreenNumber");
    let value = desc.objectForKey(key)?;

    // The value is an NSNumber containing the CGDirectDisplayID
    let number: &NSNumber = unsafe { &*(&*value as *const _ as *const NSNumber) };
    Some(number.unsignedIntValue())
}

/// Top safe-area inset plus the widths of the menu bar areas left and right
/// of the camera housing. Older systems report no inset and no areas.
fn read_cutout_metrics(screen: &NSScreen) -> (f64, Option<f64>, Option<f64>) {
    let has_safe_area: bool = unsafe { msg_send![screen, respondsToSelector: sel!(safeAreaInsets)] };
    if !has_safe_area {
        return (0.0, None, None);
    }
    let insets: NSEdgeInsets = unsafe { msg_send![screen, safeAreaInsets] };

    let has_aux_areas: bool =
        unsafe { msg_send![screen, respondsToSelector: sel!(auxiliaryTopLeftArea)] };
    if !has_aux_areas {
        return (insets.top, None, None);
    }
    let left: NSRect = unsafe { msg_send![screen, auxiliaryTopLeftArea] };
    let right: NSRect = unsafe { msg_send![screen, auxiliaryTopRightArea] };

    (insets.top, Some(left.size.width), Some(right.size.width))
}
