use crate::effect::Effect;

use super::model::NotchModel;

/// Carries out effects produced by the notch state machine. Must be called
/// with no borrow of the machine held, since observers may call back in.
pub fn execute_effects(model: &NotchModel, effects: Vec<Effect>) {
    for effect in effects {
        execute_effect(model, effect);
    }
}

fn execute_effect(model: &NotchModel, effect: Effect) {
    match effect {
        Effect::StatusChanged { from, to } => {
            tracing::debug!("Notch state {:?} -> {:?}", from, to);
            model.status.set(to);
        }
        Effect::Haptic => {
            model.haptic.emit(());
        }
        Effect::SchedulePopRevert { generation } => {
            if let Some(previous) = model.pop_revert.take() {
                model.scheduler.cancel(previous);
            }
            let weak = model.weak_self.clone();
            let id = model.scheduler.schedule_once(
                model.pop_duration,
                Box::new(move || {
                    if let Some(model) = weak.upgrade() {
                        model.pop_revert.set(None);
                        model.pop_expired(generation);
                    }
                }),
            );
            model.pop_revert.set(Some(id));
        }
        Effect::CancelPopRevert => {
            if let Some(id) = model.pop_revert.take() {
                model.scheduler.cancel(id);
            }
        }
    }
}
