use crate::button::{Axis, Button, Control, DpadDirection};
use crate::driver::{RumbleState, Slot, VirtualBus};
use crate::error::{Error, Result};
use crate::rumble::RumbleMonitor;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;

pub const AXIS_MAX: i32 = 32767;
pub const AXIS_MIN: i32 = -32768;
pub const TRIGGER_MAX: u8 = 255;

/// Pause before each button release so games register the press
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(100);

/// A virtual Xbox 360 controller plugged into one bus slot.
///
/// Unplugs itself on drop. Every feeding call is forwarded to the driver and
/// fails with [`Error::DriverRejected`] when the driver reports failure.
pub struct VirtualXboxController<B: VirtualBus + ?Sized> {
    bus: Arc<B>,
    slot: Slot,
    release_delay: Duration,
}

impl<B: VirtualBus + ?Sized> VirtualXboxController<B> {
    /// Plugs a controller into `index` (1 to 4) and resets it to neutral.
    ///
    /// `force_ownership` first unplugs whatever device occupies the slot, even
    /// one owned by another process.
    pub fn new(bus: Arc<B>, index: u32, force_ownership: bool) -> Result<Self> {
        let slot = Slot::new(index)?;

        log::debug!(
            "Plugging virtual controller into slot {} (bus present: {})",
            slot,
            bus.bus_exists()
        );
        plug(&*bus, slot, force_ownership)?;

        let controller = Self {
            bus,
            slot,
            release_delay: DEFAULT_RELEASE_DELAY,
        };
        log::debug!(
            "Slot {}: exists={}, acquired={}",
            slot,
            controller.exists(),
            controller.acquired()
        );

        controller.reset()?;
        log::info!("Virtual Xbox controller plugged into slot {}", slot);
        Ok(controller)
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn bus(&self) -> &Arc<B> {
        &self.bus
    }

    pub fn release_delay(&self) -> Duration {
        self.release_delay
    }

    pub fn set_release_delay(&mut self, delay: Duration) {
        self.release_delay = delay;
    }

    /// Whether this process owns the slot
    pub fn acquired(&self) -> bool {
        self.bus.controller_owned(self.slot)
    }

    pub fn exists(&self) -> bool {
        self.bus.bus_exists() && self.bus.controller_exists(self.slot)
    }

    /// Unplugs the slot (ignoring the outcome) and plugs it back in
    pub fn acquire(&self, force: bool) -> Result<()> {
        plug(&*self.bus, self.slot, force)
    }

    pub fn release(&self, force: bool) -> Result<()> {
        unplug(&*self.bus, self.slot, force)
    }

    /// Driver-assigned LED (player) number for this slot
    pub fn led_number(&self) -> Result<u8> {
        self.bus
            .led_number(self.slot)
            .ok_or_else(|| self.rejected("GetLedNumber"))
    }

    pub fn set_axis(&self, axis: Axis, value: i32) -> Result<()> {
        let value = value.clamp(AXIS_MIN, AXIS_MAX) as i16;
        self.check(self.bus.set_axis(self.slot, axis, value), axis.symbol())
    }

    pub fn set_axis_x(&self, value: i32) -> Result<()> {
        self.set_axis(Axis::X, value)
    }

    pub fn set_axis_y(&self, value: i32) -> Result<()> {
        self.set_axis(Axis::Y, value)
    }

    pub fn set_axis_rx(&self, value: i32) -> Result<()> {
        self.set_axis(Axis::Rx, value)
    }

    pub fn set_axis_ry(&self, value: i32) -> Result<()> {
        self.set_axis(Axis::Ry, value)
    }

    pub fn press(&self, button: Button) -> Result<()> {
        self.press_with(button, TRIGGER_MAX)
    }

    /// Presses a button. `pressure` only matters for the triggers; zero releases.
    pub fn press_with(&self, button: Button, pressure: u8) -> Result<()> {
        if pressure == 0 {
            return self.release_button_after(button, Duration::ZERO);
        }
        match button.control() {
            Control::Digital(b) => self.check(self.bus.set_button(self.slot, b, true), b.symbol()),
            Control::Trigger(t) => {
                self.check(self.bus.set_trigger(self.slot, t, pressure), t.symbol())
            }
            Control::Dpad(d) => self.check(self.bus.set_dpad(self.slot, Some(d)), d.symbol()),
        }
    }

    /// Releases after the controller's release delay
    pub fn release_button(&self, button: Button) -> Result<()> {
        self.release_button_after(button, self.release_delay)
    }

    /// Releasing any d-pad direction centers the whole d-pad
    pub fn release_button_after(&self, button: Button, delay: Duration) -> Result<()> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match button.control() {
            Control::Digital(b) => {
                self.check(self.bus.set_button(self.slot, b, false), b.symbol())
            }
            Control::Trigger(t) => self.check(self.bus.set_trigger(self.slot, t, 0), t.symbol()),
            Control::Dpad(_) => self.check(
                self.bus.set_dpad(self.slot, None),
                DpadDirection::OFF_SYMBOL,
            ),
        }
    }

    pub fn reset_axis(&self) -> Result<()> {
        for axis in Axis::ALL {
            self.set_axis(axis, 0)?;
        }
        Ok(())
    }

    pub fn reset_buttons(&self) -> Result<()> {
        for button in Button::ALL {
            self.release_button_after(button, Duration::ZERO)?;
        }
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        self.reset_axis()?;
        self.reset_buttons()
    }

    pub fn stroke(&self, button: Button) -> Result<()> {
        self.press(button)?;
        self.release_button(button)
    }

    pub fn stroke_times(&self, button: Button, times: u32) -> Result<()> {
        for _ in 0..times {
            self.stroke(button)?;
        }
        Ok(())
    }

    /// Strokes each button in turn. Reports the outcome of the last stroke.
    pub fn stroke_each(&self, buttons: &[Button]) -> Result<()> {
        let mut outcome = Ok(());
        for &button in buttons {
            outcome = self.stroke(button);
        }
        outcome
    }

    /// Holds `modifier`, presses all `buttons`, then lets go in reverse order.
    /// Every release is attempted; the first failure is reported.
    pub fn stroke_chord(&self, modifier: Button, buttons: &[Button]) -> Result<()> {
        let mut first_err = self.press(modifier).err();
        for &button in buttons {
            keep_first(&mut first_err, self.press(button));
        }
        for &button in buttons.iter().rev() {
            keep_first(&mut first_err, self.release_button(button));
        }
        keep_first(&mut first_err, self.release_button(modifier));
        first_err.map_or(Ok(()), Err)
    }

    /// Strokes `button` while holding `modifier`. The modifier is let go even if the stroke fails.
    pub fn stroke_with(&self, modifier: Button, button: Button) -> Result<()> {
        self.press(modifier)?;
        let stroke = self.stroke(button);
        let release = self.release_button(modifier);
        stroke.and(release)
    }

    /// Current rumble motor levels, each in 0.0 to 1.0
    pub fn rumble_motor_usage(&self) -> Result<RumbleState> {
        self.bus
            .vibration(self.slot)
            .map(RumbleState::from)
            .ok_or(Error::Vibration(self.slot.index()))
    }

    fn check(&self, ok: bool, call: &'static str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(self.rejected(call))
        }
    }

    fn rejected(&self, call: &'static str) -> Error {
        Error::DriverRejected {
            call,
            slot: self.slot.index(),
        }
    }
}

impl<B: VirtualBus + ?Sized + 'static> VirtualXboxController<B> {
    /// Polls the rumble motors in the background and reports every change
    pub fn watch_rumble(&self, interval: Duration) -> (RumbleMonitor, Receiver<RumbleState>) {
        RumbleMonitor::spawn(Arc::clone(&self.bus), self.slot, interval)
    }
}

impl<B: VirtualBus + ?Sized> Drop for VirtualXboxController<B> {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            log::warn!("Failed to reset slot {} before unplugging: {}", self.slot, e);
        }
        let force = self.acquired();
        match self.release(force) {
            Ok(()) => log::info!("Virtual Xbox controller unplugged from slot {}", self.slot),
            Err(e) => log::warn!("Failed to unplug slot {}: {}", self.slot, e),
        }
    }
}

fn plug<B: VirtualBus + ?Sized>(bus: &B, slot: Slot, force: bool) -> Result<()> {
    if !bus.bus_exists() {
        return Err(Error::BusNotFound { action: "plug in" });
    }
    // Clears any stale device of ours; a free slot makes this fail, which is fine
    let _ = unplug(bus, slot, force);
    if bus.plug_in(slot) {
        Ok(())
    } else {
        Err(Error::DriverRejected {
            call: "PlugIn",
            slot: slot.index(),
        })
    }
}

fn unplug<B: VirtualBus + ?Sized>(bus: &B, slot: Slot, force: bool) -> Result<()> {
    if !bus.bus_exists() {
        return Err(Error::BusNotFound { action: "un-plug" });
    }
    let (ok, call) = if force {
        (bus.unplug(slot, true), "UnPlugForce")
    } else {
        (bus.unplug(slot, false), "UnPlug")
    };
    if ok {
        Ok(())
    } else {
        Err(Error::DriverRejected {
            call,
            slot: slot.index(),
        })
    }
}

fn keep_first(first: &mut Option<Error>, result: Result<()>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}
