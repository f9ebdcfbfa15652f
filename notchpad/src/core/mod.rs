mod config;
mod display;
mod geometry;
mod notch;

pub use config::{Config, ModifierKey};
pub use display::{preferred_display, DisplayId, DisplayInfo};
pub use geometry::{Point, Rect};
pub use notch::{NotchGeometry, NotchMachine, NotchState};
