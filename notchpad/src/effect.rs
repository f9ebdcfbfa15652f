use crate::core::NotchState;

/// Side effects requested by the notch state machine. The machine itself stays
/// pure; the owning model executes these after its borrow is released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    StatusChanged { from: NotchState, to: NotchState },
    /// One tactile acknowledgement for a drop-intent open.
    Haptic,
    /// Revert `Popping` to `Closed` later, unless something supersedes it.
    SchedulePopRevert { generation: u64 },
    CancelPopRevert,
}
