mod accessibility;
mod display;
mod event_tap;
mod feedback;
mod window;

pub use accessibility::*;
pub use display::*;
pub use event_tap::*;
pub use feedback::*;
pub use window::*;
