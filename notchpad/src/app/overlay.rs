use std::rc::Rc;

use crate::core::{Config, DisplayInfo, NotchGeometry, Rect};
use crate::input::Subscription;
use crate::platform::{OverlayWindow, WindowSpec};
use crate::scheduler::TaskId;

use super::drag::DragDetector;
use super::model::NotchModel;
use super::Services;

/// Owns the overlay window for one display together with the notch model
/// driving it. Nothing else mutates the window.
pub struct OverlayController {
    display: DisplayInfo,
    frame: Rect,
    model: Rc<NotchModel>,
    drag: Rc<DragDetector>,
    window: Option<Rc<dyn OverlayWindow>>,
    services: Services,
    settle_task: Option<TaskId>,
    subscriptions: Vec<Subscription>,
}

impl OverlayController {
    pub fn new(display: DisplayInfo, config: &Config, services: &Services) -> Self {
        let geometry = NotchGeometry::new(&display, config);
        let frame = overlay_frame(&display.frame, &geometry, config.shadow_padding);

        let model = NotchModel::new(
            geometry,
            config,
            &services.bus,
            Rc::clone(&services.scheduler),
        );
        let drag = DragDetector::attach(
            &services.bus,
            model.geometry().detector_rect(),
            model.clone(),
            Rc::clone(&services.drag_probe),
        );

        let window: Rc<dyn OverlayWindow> =
            Rc::from(services.windows.create_window(&WindowSpec::overlay(frame)));
        window.show();

        let haptics = Rc::clone(&services.haptics);
        let haptic_sub = model.haptic().subscribe(move |_| haptics.perform());

        let window_weak = Rc::downgrade(&window);
        let status_sub = model.status_changes().subscribe(move |state| {
            if state.is_opened() {
                if let Some(window) = window_weak.upgrade() {
                    window.bring_to_front_as_key();
                }
            }
        });

        // Display bounds are only trusted once the window server has settled
        let model_weak = Rc::downgrade(&model);
        let displays = Rc::clone(&services.displays);
        let display_id = display.id;
        let settle_task = services.scheduler.schedule_once(
            config.settle_delay(),
            Box::new(move || {
                let Some(model) = model_weak.upgrade() else {
                    return;
                };
                match displays
                    .get_all_displays()
                    .into_iter()
                    .find(|d| d.id == display_id)
                {
                    Some(settled) => model.set_screen_rect(settled.frame),
                    None => tracing::warn!("Display {} vanished before settling", display_id),
                }
            }),
        );

        let display_name = &display.name;
        tracing::info!(
            "Overlay created on display {} ({}) at {:?}, cutout={}",
            display_id,
            display_name,
            frame,
            model.has_cutout()
        );

        Self {
            display,
            frame,
            model,
            drag,
            window: Some(window),
            services: services.clone(),
            settle_task: Some(settle_task),
            subscriptions: vec![haptic_sub, status_sub],
        }
    }

    pub fn display(&self) -> &DisplayInfo {
        &self.display
    }

    pub fn model(&self) -> &Rc<NotchModel> {
        &self.model
    }

    #[cfg(test)]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Heartbeat hook. The window server occasionally demotes the window;
    /// re-assert it while the panel is open and leave it alone otherwise.
    pub fn maintain(&self) {
        if !self.model.state().is_opened() {
            return;
        }
        if let Some(window) = &self.window {
            window.bring_to_front_as_key();
        }
    }

    /// Disposes the model before the window goes away, so no input callback
    /// can reach a closed window. Safe to call more than once.
    pub fn teardown(&mut self) {
        let Some(window) = self.window.take() else {
            return;
        };

        self.subscriptions.clear();
        self.drag.dispose();
        self.model.dispose();
        if let Some(id) = self.settle_task.take() {
            self.services.scheduler.cancel(id);
        }
        window.close();

        tracing::info!(
            "Overlay on display {} at {:?} torn down",
            self.display.id,
            self.frame
        );
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Top strip of the display, centered, tall enough for the largest state and
/// wide enough for the opened panel plus its shadow.
fn overlay_frame(display_frame: &Rect, geometry: &NotchGeometry, shadow_padding: f64) -> Rect {
    let width = (geometry.opened_size.width + 2.0 * shadow_padding).min(display_frame.width);
    let height = geometry.tallest_height() + shadow_padding;
    Rect::new(
        display_frame.mid_x() - width / 2.0,
        display_frame.y,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    use notchpad_ipc::OpenReason;

    use super::*;
    use crate::core::NotchState;
    use crate::input::InputBus;
    use crate::platform::mock::{
        create_notched_display, create_test_display, MockDisplaySystem, MockDragProbe,
        MockHapticFeedback, MockInputSource, MockWindowFactory, WindowOp,
    };
    use crate::platform::OVERLAY_WINDOW_LEVEL;
    use crate::scheduler::TimerQueue;

    struct Setup {
        timers: Rc<TimerQueue>,
        displays: Rc<MockDisplaySystem>,
        windows: Rc<MockWindowFactory>,
        haptics: Rc<MockHapticFeedback>,
        services: Services,
    }

    fn setup(display: DisplayInfo) -> Setup {
        let mut source = MockInputSource::new();
        let bus = Rc::new(InputBus::new(&mut source));
        let timers = Rc::new(TimerQueue::new(Instant::now()));
        let displays = Rc::new(MockDisplaySystem::new().with_displays(vec![display]));
        let windows = Rc::new(MockWindowFactory::new());
        let haptics = Rc::new(MockHapticFeedback::new());
        let services = Services {
            bus,
            scheduler: timers.clone(),
            displays: displays.clone(),
            windows: windows.clone(),
            haptics: haptics.clone(),
            drag_probe: Rc::new(MockDragProbe::new()),
        };
        Setup {
            timers,
            displays,
            windows,
            haptics,
            services,
        }
    }

    #[test]
    fn test_window_covers_top_strip_only() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);

        let expected = Rect::new(756.0 - 320.0, 0.0, 640.0, 180.0);
        assert_eq!(controller.frame(), expected);
        assert_eq!(
            s.windows.ops(),
            vec![
                WindowOp::Created {
                    window: 0,
                    spec: WindowSpec {
                        frame: expected,
                        level: OVERLAY_WINDOW_LEVEL,
                    },
                },
                WindowOp::Show { window: 0 },
            ]
        );
    }

    #[test]
    fn test_window_width_is_capped_by_display() {
        let display = create_test_display(1, 0.0, 0.0, 500.0, 400.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);
        assert_eq!(controller.frame().width, 500.0);
        assert_eq!(controller.frame().x, 0.0);
    }

    #[test]
    fn test_screen_rect_set_after_settle_delay() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);

        assert!(controller.model().screen_rect().is_none());
        s.timers.advance(Duration::from_millis(99));
        assert!(controller.model().screen_rect().is_none());
        s.timers.advance(Duration::from_millis(1));
        assert_eq!(
            controller.model().screen_rect(),
            Some(Rect::new(0.0, 0.0, 1512.0, 982.0))
        );
    }

    #[test]
    fn test_settle_uses_fresh_display_bounds() {
        let display = create_test_display(1, 0.0, 0.0, 1920.0, 1080.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);

        s.displays
            .set_displays(vec![create_test_display(1, 0.0, 0.0, 2560.0, 1440.0)]);
        s.timers.advance(Duration::from_millis(100));
        assert_eq!(
            controller.model().screen_rect(),
            Some(Rect::new(0.0, 0.0, 2560.0, 1440.0))
        );
    }

    #[test]
    fn test_maintain_only_fronts_open_panel() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);

        controller.maintain();
        assert_eq!(s.windows.front_count(), 0);

        controller.model().pop();
        controller.maintain();
        assert_eq!(s.windows.front_count(), 0);

        controller.model().open(OpenReason::Click);
        let after_open = s.windows.front_count();
        assert_eq!(after_open, 1);
        controller.maintain();
        assert_eq!(s.windows.front_count(), after_open + 1);

        controller.model().close();
        controller.maintain();
        assert_eq!(s.windows.front_count(), after_open + 1);
    }

    #[test]
    fn test_drag_open_performs_haptic_once() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);

        controller.model().drag_enter();
        controller.model().drag_enter();
        assert_eq!(s.haptics.count(), 1);
        assert_eq!(
            controller.model().state(),
            NotchState::Opened(OpenReason::Drag)
        );
    }

    #[test]
    fn test_teardown_disposes_model_before_closing_window() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let mut controller = OverlayController::new(display, &Config::new(), &s.services);

        let model = Rc::clone(controller.model());
        let disposed_at_close = Rc::new(Cell::new(false));
        let flag = Rc::clone(&disposed_at_close);
        let model_for_hook = Rc::clone(&model);
        s.windows
            .set_on_close(move || flag.set(model_for_hook.is_disposed()));

        controller.teardown();
        assert!(disposed_at_close.get());
        assert_eq!(s.windows.closed_windows(), vec![0]);
        assert_eq!(s.services.bus.pointer_location().subscriber_count(), 0);
        assert_eq!(s.services.bus.drag_movement().subscriber_count(), 0);

        // Settle task was cancelled and nothing reaches the disposed model
        assert_eq!(s.timers.pending(), 0);
        model.open(OpenReason::Click);
        assert_eq!(model.state(), NotchState::Closed);

        controller.teardown();
        assert_eq!(s.windows.closed_windows(), vec![0]);
    }

    #[test]
    fn test_drop_tears_down() {
        let display = create_notched_display(1, 1512.0, 982.0);
        let s = setup(display.clone());
        let controller = OverlayController::new(display, &Config::new(), &s.services);
        let model = Rc::clone(controller.model());

        drop(controller);
        assert!(model.is_disposed());
        assert_eq!(s.windows.closed_windows(), vec![0]);
    }
}
