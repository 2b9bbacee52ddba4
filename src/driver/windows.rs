use super::ffi::*;
use super::{Slot, VirtualBus};
use crate::button::{Axis, DigitalButton, DpadDirection, Trigger};
use crate::error::{Error, Result};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

struct Exports {
    is_vbus_exists: IsVBusExistsFn,
    get_num_empty_bus_slots: GetNumEmptyBusSlotsFn,
    is_controller_exists: SlotQueryFn,
    is_controller_owned: SlotQueryFn,
    plug_in: SlotCommandFn,
    unplug: SlotCommandFn,
    unplug_force: SlotCommandFn,
    set_btn_a: SetButtonFn,
    set_btn_b: SetButtonFn,
    set_btn_x: SetButtonFn,
    set_btn_y: SetButtonFn,
    set_btn_start: SetButtonFn,
    set_btn_back: SetButtonFn,
    set_btn_lt: SetButtonFn,
    set_btn_rt: SetButtonFn,
    set_btn_lb: SetButtonFn,
    set_btn_rb: SetButtonFn,
    set_btn_gd: SetButtonFn,
    set_trigger_l: SetTriggerFn,
    set_trigger_r: SetTriggerFn,
    set_axis_x: SetAxisFn,
    set_axis_y: SetAxisFn,
    set_axis_rx: SetAxisFn,
    set_axis_ry: SetAxisFn,
    set_dpad_up: SetDpadFn,
    set_dpad_down: SetDpadFn,
    set_dpad_left: SetDpadFn,
    set_dpad_right: SetDpadFn,
    set_dpad_off: SetDpadFn,
    get_led_number: GetLedNumberFn,
    get_vibration: GetVibrationFn,
}

// Each field is resolved by its export name; a missing export aborts the load.
macro_rules! resolve_exports {
    ($module:expr, { $($field:ident => $name:literal),* $(,)? }) => {
        Exports {
            $($field: match GetProcAddress($module, PCSTR(concat!($name, "\0").as_ptr())) {
                Some(p) => std::mem::transmute(p),
                None => return Err(Error::MissingSymbol($name)),
            },)*
        }
    };
}

unsafe fn resolve(module: HMODULE) -> Result<Exports> {
    Ok(resolve_exports!(module, {
        is_vbus_exists => "isVBusExists",
        get_num_empty_bus_slots => "GetNumEmptyBusSlots",
        is_controller_exists => "isControllerExists",
        is_controller_owned => "isControllerOwned",
        plug_in => "PlugIn",
        unplug => "UnPlug",
        unplug_force => "UnPlugForce",
        set_btn_a => "SetBtnA",
        set_btn_b => "SetBtnB",
        set_btn_x => "SetBtnX",
        set_btn_y => "SetBtnY",
        set_btn_start => "SetBtnStart",
        set_btn_back => "SetBtnBack",
        set_btn_lt => "SetBtnLT",
        set_btn_rt => "SetBtnRT",
        set_btn_lb => "SetBtnLB",
        set_btn_rb => "SetBtnRB",
        set_btn_gd => "SetBtnGD",
        set_trigger_l => "SetTriggerL",
        set_trigger_r => "SetTriggerR",
        set_axis_x => "SetAxisX",
        set_axis_y => "SetAxisY",
        set_axis_rx => "SetAxisRx",
        set_axis_ry => "SetAxisRy",
        set_dpad_up => "SetDpadUp",
        set_dpad_down => "SetDpadDown",
        set_dpad_left => "SetDpadLeft",
        set_dpad_right => "SetDpadRight",
        set_dpad_off => "SetDpadOff",
        get_led_number => "GetLedNumber",
        get_vibration => "GetVibration",
    }))
}

/// vXboxInterface.dll loaded at runtime
pub struct VXboxInterface {
    module: HMODULE,
    exports: Exports,
}

// The exports keep no per-thread state
unsafe impl Send for VXboxInterface {}
unsafe impl Sync for VXboxInterface {}

impl VXboxInterface {
    /// Loads the DLL through the normal search path (application directory first)
    pub fn load() -> Result<Self> {
        Self::load_from(DLL_NAME)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let module = LoadLibraryW(PCWSTR(wide.as_ptr()))
                .map_err(|e| Error::LibraryLoad(format!("{}: {}", path.display(), e)))?;

            match resolve(module) {
                Ok(exports) => {
                    log::info!("Loaded {}", path.display());
                    Ok(Self { module, exports })
                }
                Err(e) => {
                    let _ = FreeLibrary(module);
                    Err(e)
                }
            }
        }
    }
}

impl Drop for VXboxInterface {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = FreeLibrary(self.module) {
                log::warn!("Failed to unload {}: {}", DLL_NAME, e);
            }
        }
    }
}

impl VirtualBus for VXboxInterface {
    fn bus_exists(&self) -> bool {
        unsafe { (self.exports.is_vbus_exists)() != FALSE }
    }

    fn empty_slots(&self) -> Option<u8> {
        let mut slots = 0u8;
        let ok = unsafe { (self.exports.get_num_empty_bus_slots)(&mut slots) != FALSE };
        ok.then_some(slots)
    }

    fn controller_exists(&self, slot: Slot) -> bool {
        unsafe { (self.exports.is_controller_exists)(slot.index()) != FALSE }
    }

    fn controller_owned(&self, slot: Slot) -> bool {
        unsafe { (self.exports.is_controller_owned)(slot.index()) != FALSE }
    }

    fn plug_in(&self, slot: Slot) -> bool {
        unsafe { (self.exports.plug_in)(slot.index()) != FALSE }
    }

    fn unplug(&self, slot: Slot, force: bool) -> bool {
        let f = if force {
            self.exports.unplug_force
        } else {
            self.exports.unplug
        };
        unsafe { f(slot.index()) != FALSE }
    }

    fn set_button(&self, slot: Slot, button: DigitalButton, pressed: bool) -> bool {
        let f = match button {
            DigitalButton::A => self.exports.set_btn_a,
            DigitalButton::B => self.exports.set_btn_b,
            DigitalButton::X => self.exports.set_btn_x,
            DigitalButton::Y => self.exports.set_btn_y,
            DigitalButton::Start => self.exports.set_btn_start,
            DigitalButton::Back => self.exports.set_btn_back,
            DigitalButton::LeftThumb => self.exports.set_btn_lt,
            DigitalButton::RightThumb => self.exports.set_btn_rt,
            DigitalButton::LeftShoulder => self.exports.set_btn_lb,
            DigitalButton::RightShoulder => self.exports.set_btn_rb,
            DigitalButton::Guide => self.exports.set_btn_gd,
        };
        unsafe { f(slot.index(), to_bool(pressed)) != FALSE }
    }

    fn set_trigger(&self, slot: Slot, trigger: Trigger, value: u8) -> bool {
        let f = match trigger {
            Trigger::Left => self.exports.set_trigger_l,
            Trigger::Right => self.exports.set_trigger_r,
        };
        unsafe { f(slot.index(), value) != FALSE }
    }

    fn set_axis(&self, slot: Slot, axis: Axis, value: i16) -> bool {
        let f = match axis {
            Axis::X => self.exports.set_axis_x,
            Axis::Y => self.exports.set_axis_y,
            Axis::Rx => self.exports.set_axis_rx,
            Axis::Ry => self.exports.set_axis_ry,
        };
        unsafe { f(slot.index(), value) != FALSE }
    }

    fn set_dpad(&self, slot: Slot, direction: Option<DpadDirection>) -> bool {
        let f = match direction {
            Some(DpadDirection::Up) => self.exports.set_dpad_up,
            Some(DpadDirection::Down) => self.exports.set_dpad_down,
            Some(DpadDirection::Left) => self.exports.set_dpad_left,
            Some(DpadDirection::Right) => self.exports.set_dpad_right,
            None => self.exports.set_dpad_off,
        };
        unsafe { f(slot.index()) != FALSE }
    }

    fn led_number(&self, slot: Slot) -> Option<u8> {
        let mut led = 0u8;
        let ok = unsafe { (self.exports.get_led_number)(slot.index(), &mut led) != FALSE };
        ok.then_some(led)
    }

    fn vibration(&self, slot: Slot) -> Option<XInputVibration> {
        let mut vibration = XInputVibration::default();
        let ok = unsafe { (self.exports.get_vibration)(slot.index(), &mut vibration) != FALSE };
        ok.then_some(vibration)
    }
}
