use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_foundation_sys::mach_port::CFMachPortRef;
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, CallbackResult,
};

use crate::core::{ModifierKey, Point};
use crate::input::{InputChannel, InputEvent, InputSender, InputSource};

extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

type InstallResults = Vec<(InputChannel, Result<(), String>)>;

/// Listen-only session event taps, one per input channel, all serviced by a
/// dedicated thread with its own run loop.
pub struct MacOSInputSource {
    modifier: ModifierKey,
}

impl MacOSInputSource {
    pub fn new(modifier: ModifierKey) -> Self {
        Self { modifier }
    }
}

impl InputSource for MacOSInputSource {
    fn install(&mut self, sender: InputSender) -> InstallResults {
        let (result_tx, result_rx) = mpsc::channel::<InstallResults>();
        let modifier_flag = modifier_flag(self.modifier);

        let spawned = std::thread::Builder::new()
            .name("notchpad-input".to_string())
            .spawn(move || run_taps(sender, modifier_flag, result_tx));
        if let Err(e) = spawned {
            return all_failed(&format!("Failed to spawn input thread: {}", e));
        }

        result_rx
            .recv()
            .unwrap_or_else(|_| all_failed("Input thread exited before reporting"))
    }
}

fn all_failed(reason: &str) -> InstallResults {
    InputChannel::ALL
        .into_iter()
        .map(|channel| (channel, Err(reason.to_string())))
        .collect()
}

fn modifier_flag(key: ModifierKey) -> CGEventFlags {
    match key {
        ModifierKey::Option => CGEventFlags::CGEventFlagAlternate,
        ModifierKey::Command => CGEventFlags::CGEventFlagCommand,
        ModifierKey::Control => CGEventFlags::CGEventFlagControl,
        ModifierKey::Shift => CGEventFlags::CGEventFlagShift,
    }
}

fn run_taps(
    sender: InputSender,
    modifier_flag: CGEventFlags,
    result_tx: mpsc::Sender<InstallResults>,
) {
    let mut taps = Vec::new();
    let mut results = Vec::new();

    for channel in InputChannel::ALL {
        match ListenTap::install(channel, sender.clone(), modifier_flag) {
            Ok(tap) => {
                taps.push(tap);
                results.push((channel, Ok(())));
            }
            Err(e) => results.push((channel, Err(e))),
        }
    }

    let _ = result_tx.send(results);

    if taps.is_empty() {
        return;
    }
    tracing::info!("Input taps running on dedicated thread");
    CFRunLoop::run_current();
}

fn events_for(channel: InputChannel) -> Vec<CGEventType> {
    match channel {
        InputChannel::Pointer => vec![CGEventType::MouseMoved, CGEventType::LeftMouseDragged],
        InputChannel::Click => vec![CGEventType::LeftMouseDown, CGEventType::LeftMouseUp],
        InputChannel::Drag => vec![CGEventType::LeftMouseDragged],
        InputChannel::Modifier => vec![CGEventType::FlagsChanged],
    }
}

fn translate(
    channel: InputChannel,
    event_type: CGEventType,
    event: &CGEvent,
    modifier_flag: CGEventFlags,
    sender: &InputSender,
) {
    let location = event.location();
    let point = Point::new(location.x, location.y);

    match channel {
        InputChannel::Pointer => sender.send(InputEvent::PointerMoved(point)),
        InputChannel::Click if matches!(event_type, CGEventType::LeftMouseUp) => {
            sender.send(InputEvent::PrimaryReleased);
        }
        InputChannel::Click => {
            // The click is evaluated where it happened, even if the pointer
            // tap has not delivered that position yet.
            sender.send(InputEvent::PointerMoved(point));
            sender.send(InputEvent::PrimaryClick);
        }
        InputChannel::Drag => sender.send(InputEvent::DragMoved(point)),
        InputChannel::Modifier => {
            let held = event.get_flags().contains(modifier_flag);
            sender.send(InputEvent::ModifierChanged(held));
        }
    }
}

struct ListenTap {
    _tap: CGEventTap<'static>,
    _source: CFRunLoopSource,
}

impl ListenTap {
    fn install(
        channel: InputChannel,
        sender: InputSender,
        modifier_flag: CGEventFlags,
    ) -> Result<Self, String> {
        let mach_port_ptr: Arc<AtomicPtr<c_void>> = Arc::new(AtomicPtr::new(ptr::null_mut()));
        let mach_port_for_callback = Arc::clone(&mach_port_ptr);

        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::ListenOnly,
            events_for(channel),
            move |_proxy, event_type, event| {
                match event_type {
                    CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                        tracing::warn!("{:?} event tap disabled, re-enabling", channel);
                        let ptr = mach_port_for_callback.load(Ordering::Acquire);
                        if !ptr.is_null() {
                            unsafe {
                                CGEventTapEnable(ptr as CFMachPortRef, true);
                            }
                        }
                    }
                    _ => translate(channel, event_type, event, modifier_flag, &sender),
                }
                CallbackResult::Keep
            },
        )
        .map_err(|_| {
            format!(
                "Failed to create {:?} event tap. Make sure Accessibility permission is granted.",
                channel
            )
        })?;

        mach_port_ptr.store(
            tap.mach_port().as_concrete_TypeRef() as *mut c_void,
            Ordering::Release,
        );

        tap.enable();

        let source = tap
            .mach_port()
            .create_runloop_source(0)
            .map_err(|_| format!("Failed to create run loop source for {:?} tap", channel))?;

        CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopCommonModes });

        Ok(Self {
            _tap: tap,
            _source: source,
        })
    }
}
