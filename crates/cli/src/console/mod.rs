//! Interactive announcer console.

mod command;
mod display;
mod session;

pub use display::render_event;
pub use session::{Console, Flow};
