pub mod command;
pub mod state;

pub use command::{Command, Response};
pub use state::{NotchStatus, OpenReason, RectInfo, StateInfo};
