mod bus;
mod channel;
mod event;

pub use bus::{InputBus, InputChannel, InputSource};
pub use channel::{PulseChannel, Subscription, ValueChannel};
pub use event::{InputEvent, InputSender};
