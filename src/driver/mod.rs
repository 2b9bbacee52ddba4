pub mod ffi;
mod mock;
#[cfg(windows)]
mod windows;

pub use mock::{MockBus, SlotState};
#[cfg(windows)]
pub use windows::VXboxInterface;

use crate::button::{Axis, DigitalButton, DpadDirection, Trigger};
use crate::error::{Error, Result};
use ffi::XInputVibration;
use std::fmt;

pub const MIN_SLOT: u32 = 1;
pub const MAX_SLOT: u32 = 4;

/// Maximum raw motor speed reported by the driver
pub const VIBRATION_MAX: u16 = u16::MAX;

/// A validated bus slot (1 to 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    pub fn new(index: u32) -> Result<Self> {
        if (MIN_SLOT..=MAX_SLOT).contains(&index) {
            Ok(Self(index))
        } else {
            Err(Error::InvalidSlot(index))
        }
    }

    /// The driver's UserIndex for this slot
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (MIN_SLOT..=MAX_SLOT).map(Slot)
    }

    pub(crate) fn offset(self) -> usize {
        (self.0 - MIN_SLOT) as usize
    }
}

impl TryFrom<u32> for Slot {
    type Error = Error;

    fn try_from(index: u32) -> Result<Self> {
        Slot::new(index)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rumble feedback read back from the virtual controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RumbleState {
    /// Large (low-frequency) motor strength (0.0 to 1.0)
    pub large_motor: f32,
    /// Small (high-frequency) motor strength (0.0 to 1.0)
    pub small_motor: f32,
}

impl From<XInputVibration> for RumbleState {
    fn from(vibration: XInputVibration) -> Self {
        Self {
            large_motor: vibration.left_motor_speed as f32 / VIBRATION_MAX as f32,
            small_motor: vibration.right_motor_speed as f32 / VIBRATION_MAX as f32,
        }
    }
}

/// The driver-facing side of the binding.
///
/// Methods map one-to-one onto groups of vXboxInterface exports. Setters and
/// plug calls return the driver's success flag; queries with an out-parameter
/// return `None` when the driver reports failure.
pub trait VirtualBus: Send + Sync {
    fn bus_exists(&self) -> bool;
    fn empty_slots(&self) -> Option<u8>;
    fn controller_exists(&self, slot: Slot) -> bool;
    fn controller_owned(&self, slot: Slot) -> bool;

    fn plug_in(&self, slot: Slot) -> bool;
    /// `force` unplugs even a device owned by another process
    fn unplug(&self, slot: Slot, force: bool) -> bool;

    fn set_button(&self, slot: Slot, button: DigitalButton, pressed: bool) -> bool;
    fn set_trigger(&self, slot: Slot, trigger: Trigger, value: u8) -> bool;
    fn set_axis(&self, slot: Slot, axis: Axis, value: i16) -> bool;
    /// `None` centers the d-pad
    fn set_dpad(&self, slot: Slot, direction: Option<DpadDirection>) -> bool;

    fn led_number(&self, slot: Slot) -> Option<u8>;
    fn vibration(&self, slot: Slot) -> Option<XInputVibration>;
}
