#![cfg_attr(not(windows), allow(dead_code))]

// Entry points exported by vXboxInterface.dll (ScpVBus feeder interface).
// Every call returns a Win32 BOOL, nonzero on success.

pub const DLL_NAME: &str = "vXboxInterface.dll";

pub type Bool = i32;

pub const FALSE: Bool = 0;
pub const TRUE: Bool = 1;

/// XINPUT_VIBRATION as filled in by `GetVibration`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XInputVibration {
    /// Low-frequency (large) motor
    pub left_motor_speed: u16,
    /// High-frequency (small) motor
    pub right_motor_speed: u16,
}

// Status
pub type IsVBusExistsFn = unsafe extern "C" fn() -> Bool;
pub type GetNumEmptyBusSlotsFn = unsafe extern "C" fn(n_slots: *mut u8) -> Bool;
pub type SlotQueryFn = unsafe extern "C" fn(user_index: u32) -> Bool;

// Plug-in / unplug share the same shape as the slot queries
pub type SlotCommandFn = unsafe extern "C" fn(user_index: u32) -> Bool;

// Data feeding
pub type SetButtonFn = unsafe extern "C" fn(user_index: u32, press: Bool) -> Bool;
pub type SetTriggerFn = unsafe extern "C" fn(user_index: u32, value: u8) -> Bool;
pub type SetAxisFn = unsafe extern "C" fn(user_index: u32, value: i16) -> Bool;
pub type SetDpadFn = unsafe extern "C" fn(user_index: u32) -> Bool;

// Feedback
pub type GetLedNumberFn = unsafe extern "C" fn(user_index: u32, led: *mut u8) -> Bool;
pub type GetVibrationFn =
    unsafe extern "C" fn(user_index: u32, vibration: *mut XInputVibration) -> Bool;

pub fn to_bool(value: bool) -> Bool {
    if value {
        TRUE
    } else {
        FALSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vibration_layout_matches_xinput() {
        assert_eq!(std::mem::size_of::<XInputVibration>(), 4);
        assert_eq!(std::mem::align_of::<XInputVibration>(), 2);
    }

    #[test]
    fn bool_conversion() {
        assert_eq!(to_bool(true), 1);
        assert_eq!(to_bool(false), 0);
    }
}
