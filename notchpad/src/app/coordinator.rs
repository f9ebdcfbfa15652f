use std::cell::RefCell;
use std::rc::Rc;

use notchpad_ipc::{Command, OpenReason, Response, StateInfo};

use crate::core::{preferred_display, Config};
use crate::input::InputChannel;
use crate::scheduler::TaskId;

use super::model::NotchModel;
use super::overlay::OverlayController;
use super::Services;

/// Process lifecycle glue: picks the display, (re)builds the overlay, runs
/// the heartbeat and routes external commands.
pub struct Coordinator {
    config: Config,
    services: Services,
    controller: Rc<RefCell<Option<OverlayController>>>,
    heartbeat: Option<TaskId>,
}

impl Coordinator {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config,
            services,
            controller: Rc::new(RefCell::new(None)),
            heartbeat: None,
        }
    }

    pub fn launch(&mut self) {
        tracing::info!("Launching overlay");
        let inert: Vec<InputChannel> = InputChannel::ALL
            .into_iter()
            .filter(|channel| !self.services.bus.is_live(*channel))
            .collect();
        if !inert.is_empty() {
            tracing::warn!("Running with inert input channels: {:?}", inert);
        }

        self.rebuild();
        self.arm_heartbeat();
    }

    /// Full teardown and rebuild against the current preferred display.
    pub fn handle_display_change(&mut self) {
        tracing::info!("Display configuration changed, rebuilding overlay");
        self.rebuild();
    }

    /// The user invoked the app again while it was running.
    pub fn reactivate(&self) {
        match self.model() {
            Some(model) => model.open(OpenReason::Click),
            None => tracing::debug!("Reactivation ignored, no overlay"),
        }
    }

    pub fn handle_command(&mut self, cmd: &Command) -> Response {
        match cmd {
            Command::Open => self.with_model(|m| m.open(OpenReason::Click)),
            Command::Close => self.with_model(|m| m.close()),
            Command::Pop => self.with_model(|m| m.pop()),
            Command::Reactivate => {
                self.reactivate();
                Response::Ok
            }
            Command::GetState => Response::State {
                state: self.state_info(),
            },
            Command::Quit => {
                tracing::info!("Quit command received");
                Response::Ok
            }
        }
    }

    pub fn state_info(&self) -> StateInfo {
        let controller = self.controller.borrow();
        let Some(controller) = controller.as_ref() else {
            return StateInfo::inactive();
        };

        let model = controller.model();
        StateInfo {
            status: model.status(),
            reason: model.reason(),
            display_id: Some(controller.display().id),
            has_cutout: model.has_cutout(),
            device_notch_rect: Some(model.device_notch_rect().into()),
            screen_rect: model.screen_rect().map(Into::into),
            shape_rect: Some(model.shape_rect().into()),
            corner_radius: model.corner_radius(),
            inset: model.inset(),
            spacing: model.spacing(),
        }
    }

    /// Cancels the heartbeat, then tears down the overlay and its model.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.heartbeat.take() {
            self.services.scheduler.cancel(id);
        }
        let controller = self.controller.borrow_mut().take();
        if let Some(mut controller) = controller {
            controller.teardown();
        }
        tracing::info!("Coordinator shut down");
    }

    fn model(&self) -> Option<Rc<NotchModel>> {
        self.controller
            .borrow()
            .as_ref()
            .map(|controller| Rc::clone(controller.model()))
    }

    fn with_model(&self, f: impl FnOnce(&NotchModel)) -> Response {
        match self.model() {
            Some(model) => {
                f(&model);
                Response::Ok
            }
            None => Response::Error {
                message: "No overlay is active".to_string(),
            },
        }
    }

    fn rebuild(&mut self) {
        let previous = self.controller.borrow_mut().take();
        if let Some(mut previous) = previous {
            previous.teardown();
        }

        let displays = self.services.displays.get_all_displays();
        let Some(display) = preferred_display(&displays) else {
            tracing::warn!("No displays available, running without an overlay");
            return;
        };

        let controller = OverlayController::new(display.clone(), &self.config, &self.services);
        *self.controller.borrow_mut() = Some(controller);
    }

    fn arm_heartbeat(&mut self) {
        if self.heartbeat.is_some() {
            return;
        }

        let controller = Rc::downgrade(&self.controller);
        let id = self.services.scheduler.schedule_repeating(
            self.config.heartbeat_interval(),
            Box::new(move || {
                let Some(controller) = controller.upgrade() else {
                    return;
                };
                if let Some(controller) = controller.borrow().as_ref() {
                    controller.maintain();
                };
            }),
        );
        self.heartbeat = Some(id);
    }
}
