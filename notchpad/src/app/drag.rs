use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::{Point, Rect};
use crate::input::{InputBus, Subscription};
use crate::platform::DragProbe;

use super::model::NotchModel;

/// Receiver of drop-boundary signals.
pub trait TransitionSink {
    fn pop(&self);
    fn drag_enter(&self);
    fn drag_leave(&self);
}

impl TransitionSink for NotchModel {
    fn pop(&self) {
        NotchModel::pop(self);
    }

    fn drag_enter(&self) {
        NotchModel::drag_enter(self);
    }

    fn drag_leave(&self) {
        NotchModel::drag_leave(self);
    }
}

/// Drop-target boundary around the notch.
///
/// Turns bus drag movement into drag-enter/drag-leave signals for the sink.
/// A drag counts as carrying a payload once the drag pasteboard has changed
/// since the mouse went down; until then entering the region only pops.
pub struct DragDetector {
    sink: Rc<dyn TransitionSink>,
    probe: Rc<dyn DragProbe>,
    region: Rect,
    baseline: Cell<i64>,
    inside: Cell<bool>,
    entered: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl DragDetector {
    pub fn attach(
        bus: &InputBus,
        region: Rect,
        sink: Rc<dyn TransitionSink>,
        probe: Rc<dyn DragProbe>,
    ) -> Rc<Self> {
        let baseline = probe.change_count();
        let detector = Rc::new(Self {
            sink,
            probe,
            region,
            baseline: Cell::new(baseline),
            inside: Cell::new(false),
            entered: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&detector);
        let click = bus.primary_click().subscribe(move |_| {
            if let Some(detector) = weak.upgrade() {
                detector.mouse_down();
            }
        });
        let weak = Rc::downgrade(&detector);
        let drag = bus.drag_movement().subscribe(move |point| {
            if let Some(detector) = weak.upgrade() {
                detector.drag_moved(*point);
            }
        });
        detector.subscriptions.borrow_mut().extend([click, drag]);

        detector
    }

    #[cfg(test)]
    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn dispose(&self) {
        self.subscriptions.borrow_mut().clear();
    }

    fn mouse_down(&self) {
        self.baseline.set(self.probe.change_count());
        self.inside.set(false);
        self.entered.set(false);
    }

    fn has_payload(&self) -> bool {
        self.probe.change_count() != self.baseline.get()
    }

    fn drag_moved(&self, point: Point) {
        let inside = self.region.contains(point);
        let was_inside = self.inside.replace(inside);

        match (was_inside, inside) {
            (false, true) => {
                if self.has_payload() {
                    self.enter();
                } else {
                    tracing::debug!("Drag without payload reached the notch");
                    self.sink.pop();
                }
            }
            // The payload can be confirmed after the pointer is already inside
            (true, true) if !self.entered.get() && self.has_payload() => self.enter(),
            (true, false) => {
                self.entered.set(false);
                self.sink.drag_leave();
            }
            _ => {}
        }
    }

    fn enter(&self) {
        self.entered.set(true);
        self.sink.drag_enter();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use notchpad_ipc::OpenReason;

    use super::*;
    use crate::core::{Config, DisplayInfo, NotchGeometry, NotchState};
    use crate::input::{InputEvent, InputSender};
    use crate::platform::mock::{
        create_notched_display, create_test_display, MockDragProbe, MockInputSource,
    };
    use crate::scheduler::TimerQueue;

    struct Setup {
        sender: InputSender,
        bus: InputBus,
        probe: Rc<MockDragProbe>,
        model: Rc<NotchModel>,
        detector: Rc<DragDetector>,
    }

    fn setup() -> Setup {
        let mut config = Config::new();
        config.open_on_hover = false;
        setup_with(config, create_test_display(1, 0.0, 0.0, 1920.0, 1080.0))
    }

    fn setup_with(config: Config, display: DisplayInfo) -> Setup {
        let mut source = MockInputSource::new();
        let bus = InputBus::new(&mut source);
        let timers = Rc::new(TimerQueue::new(Instant::now()));
        let geometry = NotchGeometry::new(&display, &config);
        let model = NotchModel::new(geometry, &config, &bus, timers);
        let probe = Rc::new(MockDragProbe::new());
        let region = model.geometry().detector_rect();
        let detector = DragDetector::attach(&bus, region, model.clone(), probe.clone());
        Setup {
            sender: source.sender(),
            bus,
            probe,
            model,
            detector,
        }
    }

    impl Setup {
        fn mouse_down_at(&self, point: Point) {
            self.sender.send(InputEvent::PointerMoved(point));
            self.sender.send(InputEvent::PrimaryClick);
            self.bus.pump();
        }

        fn drag_to(&self, point: Point) {
            self.sender.send(InputEvent::PointerMoved(point));
            self.sender.send(InputEvent::DragMoved(point));
            self.bus.pump();
        }
    }

    #[test]
    fn test_region_is_notch_expanded_by_margin() {
        let s = setup();
        // Synthetic notch 885..1035 x 0..28, margin 32
        assert_eq!(s.detector.region(), Rect::new(853.0, -32.0, 214.0, 92.0));
    }

    #[test]
    fn test_drag_with_payload_opens_for_drag() {
        let s = setup();
        s.mouse_down_at(Point::new(200.0, 500.0));
        s.probe.bump();

        s.drag_to(Point::new(600.0, 300.0));
        assert_eq!(s.model.state(), NotchState::Closed);

        s.drag_to(Point::new(960.0, 40.0));
        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));
    }

    #[test]
    fn test_payload_drag_opens_for_drag_with_hover_enabled() {
        let s = setup_with(Config::new(), create_notched_display(1, 1512.0, 982.0));
        let haptics = Rc::new(Cell::new(0));
        let haptics_clone = Rc::clone(&haptics);
        let _sub = s
            .model
            .haptic()
            .subscribe(move |_| haptics_clone.set(haptics_clone.get() + 1));

        s.mouse_down_at(Point::new(200.0, 500.0));
        s.probe.bump();
        s.drag_to(Point::new(756.0, 300.0));
        s.drag_to(Point::new(756.0, 20.0));

        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));
        assert_eq!(haptics.get(), 1);

        s.drag_to(Point::new(756.0, 500.0));
        assert_eq!(s.model.state(), NotchState::Closed);
    }

    #[test]
    fn test_drag_against_top_edge_keeps_panel_open() {
        let mut config = Config::new();
        config.open_on_hover = false;
        let s = setup_with(config, create_notched_display(1, 1512.0, 982.0));

        s.mouse_down_at(Point::new(200.0, 500.0));
        s.probe.bump();
        s.drag_to(Point::new(756.0, 300.0));
        s.drag_to(Point::new(756.0, 2.0));
        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));

        // Above the inset-shrunk hit rect on a real cutout
        s.drag_to(Point::new(757.0, 1.0));
        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));
        s.drag_to(Point::new(756.0, 20.0));
        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));

        s.drag_to(Point::new(756.0, 400.0));
        assert_eq!(s.model.state(), NotchState::Closed);
    }

    #[test]
    fn test_drag_without_payload_pops_then_leaves() {
        let s = setup();
        s.mouse_down_at(Point::new(200.0, 500.0));

        s.drag_to(Point::new(960.0, 40.0));
        assert_eq!(s.model.state(), NotchState::Popping);

        s.drag_to(Point::new(960.0, 300.0));
        assert_eq!(s.model.state(), NotchState::Closed);
    }

    #[test]
    fn test_payload_confirmed_while_inside_upgrades_pop() {
        let s = setup();
        s.mouse_down_at(Point::new(200.0, 500.0));
        s.drag_to(Point::new(960.0, 40.0));
        assert_eq!(s.model.state(), NotchState::Popping);

        s.probe.bump();
        s.drag_to(Point::new(961.0, 41.0));
        assert_eq!(s.model.state(), NotchState::Opened(OpenReason::Drag));
    }

    #[test]
    fn test_payload_from_previous_gesture_is_ignored() {
        let s = setup();
        s.probe.bump();
        s.mouse_down_at(Point::new(200.0, 500.0));

        s.drag_to(Point::new(960.0, 40.0));
        assert_eq!(s.model.state(), NotchState::Popping);
    }

    #[test]
    fn test_dispose_stops_listening() {
        let s = setup();
        s.detector.dispose();
        assert_eq!(s.bus.drag_movement().subscriber_count(), 0);

        s.mouse_down_at(Point::new(200.0, 500.0));
        s.probe.bump();
        s.drag_to(Point::new(960.0, 40.0));
        assert_eq!(s.model.state(), NotchState::Closed);
    }

    #[derive(Default)]
    struct RecordingSink {
        signals: RefCell<Vec<&'static str>>,
    }

    impl TransitionSink for RecordingSink {
        fn pop(&self) {
            self.signals.borrow_mut().push("pop");
        }

        fn drag_enter(&self) {
            self.signals.borrow_mut().push("enter");
        }

        fn drag_leave(&self) {
            self.signals.borrow_mut().push("leave");
        }
    }

    #[test]
    fn test_signals_follow_region_crossings() {
        let mut source = MockInputSource::new();
        let bus = InputBus::new(&mut source);
        let sender = source.sender();
        let sink = Rc::new(RecordingSink::default());
        let probe = Rc::new(MockDragProbe::new());
        let _detector = DragDetector::attach(
            &bus,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            sink.clone(),
            probe.clone(),
        );

        sender.send(InputEvent::PrimaryClick);
        sender.send(InputEvent::DragMoved(Point::new(50.0, 50.0)));
        sender.send(InputEvent::DragMoved(Point::new(60.0, 60.0)));
        bus.pump();
        probe.bump();
        sender.send(InputEvent::DragMoved(Point::new(70.0, 70.0)));
        sender.send(InputEvent::DragMoved(Point::new(80.0, 80.0)));
        sender.send(InputEvent::DragMoved(Point::new(500.0, 500.0)));
        sender.send(InputEvent::DragMoved(Point::new(50.0, 50.0)));
        bus.pump();

        assert_eq!(
            *sink.signals.borrow(),
            vec!["pop", "enter", "leave", "enter"]
        );
    }
}
