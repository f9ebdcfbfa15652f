#[cfg(target_os = "macos")]
mod channels;
mod coordinator;
mod drag;
mod effects;
mod model;
mod overlay;

use std::rc::Rc;

use anyhow::Result;

use crate::input::InputBus;
use crate::platform::{DisplaySystem, DragProbe, HapticFeedback, WindowFactory};
use crate::scheduler::Scheduler;

pub use coordinator::Coordinator;

/// Process-wide collaborators, built once and shared by every overlay.
#[derive(Clone)]
pub struct Services {
    pub bus: Rc<InputBus>,
    pub scheduler: Rc<dyn Scheduler>,
    pub displays: Rc<dyn DisplaySystem>,
    pub windows: Rc<dyn WindowFactory>,
    pub haptics: Rc<dyn HapticFeedback>,
    pub drag_probe: Rc<dyn DragProbe>,
}

pub struct App {}

#[cfg(not(target_os = "macos"))]
impl App {
    pub fn run() -> Result<()> {
        anyhow::bail!("notchpad only runs on macOS");
    }
}

#[cfg(target_os = "macos")]
mod main_loop {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc as std_mpsc;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
    use objc2::MainThreadMarker;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};

    use notchpad_ipc::Command;

    use super::channels::{create_channels, run_async, IpcCommandWithResponse, MainChannels};
    use super::{App, Coordinator, Services};
    use crate::core::Config;
    use crate::input::InputBus;
    use crate::macos::{self, DisplayReconfigEvent, MacOSInputSource};
    use crate::platform::{
        MacOSDisplaySystem, MacOSDragProbe, MacOSHapticFeedback, MacOSWindowFactory,
    };
    use crate::scheduler::TimerQueue;

    /// Reconfiguration callbacks fire once before and once after a change.
    const BEGIN_CONFIGURATION_FLAG: u32 = 1;

    const TICK_INTERVAL_SECS: f64 = 0.016;

    struct RunLoopContext {
        mtm: MainThreadMarker,
        ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
        display_reconfig_rx: std_mpsc::Receiver<DisplayReconfigEvent>,
        bus: Rc<InputBus>,
        timers: Rc<TimerQueue>,
        coordinator: RefCell<Coordinator>,
    }

    impl App {
        pub fn run() -> Result<()> {
            let mtm = MainThreadMarker::new().context("Must be called from main thread")?;

            let app = NSApplication::sharedApplication(mtm);
            app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

            if !macos::is_trusted() {
                tracing::warn!(
                    "Accessibility permission not granted, global pointer and key hooks may stay inert"
                );
            }

            let config = Config::load();
            let (tokio_channels, main_channels) = create_channels();

            std::thread::Builder::new()
                .name("notchpad-ipc".to_string())
                .spawn(move || match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt.block_on(run_async(tokio_channels)),
                    Err(e) => tracing::error!("Failed to start tokio runtime: {}", e),
                })
                .context("Failed to spawn IPC thread")?;

            let mut input_source = MacOSInputSource::new(config.modifier_key);
            let bus = Rc::new(InputBus::new(&mut input_source));
            let timers = Rc::new(TimerQueue::new(Instant::now()));

            let services = Services {
                bus: Rc::clone(&bus),
                scheduler: timers.clone(),
                displays: Rc::new(MacOSDisplaySystem),
                windows: Rc::new(MacOSWindowFactory::new(mtm)),
                haptics: Rc::new(MacOSHapticFeedback),
                drag_probe: Rc::new(MacOSDragProbe),
            };

            let mut coordinator = Coordinator::new(config, services);
            coordinator.launch();

            let MainChannels {
                ipc_cmd_rx,
                display_reconfig_tx,
                display_reconfig_rx,
            } = main_channels;

            if let Err(e) = macos::register_display_callback(display_reconfig_tx) {
                tracing::warn!("Display changes will not be tracked: {}", e);
            }

            let context = Box::new(RunLoopContext {
                mtm,
                ipc_cmd_rx,
                display_reconfig_rx,
                bus,
                timers,
                coordinator: RefCell::new(coordinator),
            });
            install_tick(context);

            tracing::info!("Entering NSApplication run loop");
            app.run();
            tracing::info!("NSApplication run loop exited");
            Ok(())
        }
    }

    fn install_tick(context: Box<RunLoopContext>) {
        let mut timer_context = core_foundation::runloop::CFRunLoopTimerContext {
            version: 0,
            info: Box::into_raw(context) as *mut _,
            retain: None,
            release: None,
            copyDescription: None,
        };

        extern "C" fn timer_callback(
            _timer: core_foundation::runloop::CFRunLoopTimerRef,
            info: *mut std::ffi::c_void,
        ) {
            let ctx = unsafe { &*(info as *const RunLoopContext) };
            tick(ctx);
        }

        let timer = unsafe {
            core_foundation::runloop::CFRunLoopTimer::new(
                core_foundation::date::CFAbsoluteTimeGetCurrent(),
                TICK_INTERVAL_SECS,
                0,
                0,
                timer_callback,
                &mut timer_context,
            )
        };

        // Common modes keep ticking during menu tracking and drags
        CFRunLoop::get_current().add_timer(&timer, unsafe { kCFRunLoopCommonModes });
    }

    fn tick(ctx: &RunLoopContext) {
        // A burst of callbacks is one rebuild
        let mut display_changed = false;
        while let Ok(event) = ctx.display_reconfig_rx.try_recv() {
            tracing::debug!(
                "Display reconfiguration: display={}, flags={:#x}",
                event.display_id,
                event.flags
            );
            if event.flags & BEGIN_CONFIGURATION_FLAG == 0 {
                display_changed = true;
            }
        }
        if display_changed {
            ctx.coordinator.borrow_mut().handle_display_change();
        }

        while let Ok((cmd, resp_tx)) = ctx.ipc_cmd_rx.try_recv() {
            tracing::debug!("Received IPC command: {:?}", cmd);
            let response = ctx.coordinator.borrow_mut().handle_command(&cmd);
            let _ = resp_tx.blocking_send(response);

            // Handle Quit command after sending response
            if matches!(cmd, Command::Quit) {
                ctx.coordinator.borrow_mut().shutdown();
                NSApplication::sharedApplication(ctx.mtm).terminate(None);
                return;
            }
        }

        ctx.bus.pump();
        ctx.timers.run_due(Instant::now());
    }
}
