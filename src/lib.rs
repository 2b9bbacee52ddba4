//! Feed virtual Xbox 360 controllers on ScpVBus through `vXboxInterface.dll`.
//!
//! [`VirtualXboxController`] owns one bus slot: it plugs the device in, feeds
//! buttons, triggers and sticks, reads the rumble motors back and unplugs on
//! drop. The driver itself sits behind the [`VirtualBus`] trait, with
//! [`driver::VXboxInterface`] for the real DLL on Windows and
//! [`driver::MockBus`] everywhere else.

pub mod button;
pub mod config;
pub mod controller;
pub mod driver;
mod error;
pub mod rumble;
pub mod script;

pub use button::{Axis, Button};
pub use controller::VirtualXboxController;
pub use driver::{RumbleState, Slot, VirtualBus};
pub use error::{Error, Result};
pub use rumble::RumbleMonitor;
pub use script::{load_script, run_script, Step};
