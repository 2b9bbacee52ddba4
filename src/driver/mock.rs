use super::ffi::XInputVibration;
use super::{Slot, VirtualBus, MAX_SLOT};
use crate::button::{Axis, DigitalButton, DpadDirection, Trigger};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What the mock driver holds for one slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotState {
    pub plugged: bool,
    /// Plugged in by this process
    pub owned: bool,
    pub pressed: HashSet<DigitalButton>,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub axes: [i16; 4],
    pub dpad: Option<DpadDirection>,
    pub led: u8,
    pub vibration: XInputVibration,
}

impl SlotState {
    pub fn axis(&self, axis: Axis) -> i16 {
        self.axes[axis.index()]
    }

    pub fn trigger(&self, trigger: Trigger) -> u8 {
        match trigger {
            Trigger::Left => self.left_trigger,
            Trigger::Right => self.right_trigger,
        }
    }

    pub fn is_pressed(&self, button: DigitalButton) -> bool {
        self.pressed.contains(&button)
    }
}

/// Oldest calls are dropped past this many
pub const CALL_LOG_LIMIT: usize = 1024;

#[derive(Debug)]
struct MockState {
    bus_present: bool,
    slots: [SlotState; MAX_SLOT as usize],
    rejected: HashSet<&'static str>,
    calls: VecDeque<String>,
}

/// In-memory stand-in for ScpVBus + vXboxInterface.dll
#[derive(Debug)]
pub struct MockBus {
    state: Mutex<MockState>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// A bus with all four slots free
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                bus_present: true,
                slots: Default::default(),
                rejected: HashSet::new(),
                calls: VecDeque::new(),
            }),
        }
    }

    /// Behaves as if ScpVBus is not installed
    pub fn without_bus() -> Self {
        let bus = Self::new();
        bus.set_bus_present(false);
        bus
    }

    /// Installs or removes the bus; slot state survives a removal
    pub fn set_bus_present(&self, present: bool) {
        self.lock().bus_present = present;
    }

    /// Marks a slot as plugged in by another process
    pub fn occupy(&self, slot: Slot) {
        let mut state = self.lock();
        let entry = &mut state.slots[slot.offset()];
        entry.plugged = true;
        entry.owned = false;
        entry.led = slot.index() as u8;
    }

    /// Simulates a game sending rumble to the slot
    pub fn set_vibration(&self, slot: Slot, left_motor_speed: u16, right_motor_speed: u16) {
        self.lock().slots[slot.offset()].vibration = XInputVibration {
            left_motor_speed,
            right_motor_speed,
        };
    }

    /// Makes every call to the named export fail, e.g. `"SetBtnA"` or `"PlugIn"`
    pub fn reject(&self, symbol: &'static str) {
        self.lock().rejected.insert(symbol);
    }

    pub fn accept(&self, symbol: &'static str) {
        self.lock().rejected.remove(symbol);
    }

    pub fn slot_state(&self, slot: Slot) -> SlotState {
        self.lock().slots[slot.offset()].clone()
    }

    /// The most recent driver exports invoked, formatted as `Symbol(slot[, value])`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and runs `apply` against the slot if the driver would accept it.
    /// Feeding calls need the slot to be owned by us.
    fn feed(
        &self,
        symbol: &'static str,
        slot: Slot,
        value: Option<i32>,
        apply: impl FnOnce(&mut SlotState),
    ) -> bool {
        let mut state = self.lock();
        state.record(match value {
            Some(v) => format!("{}({}, {})", symbol, slot, v),
            None => format!("{}({})", symbol, slot),
        });
        if !state.bus_present || state.rejected.contains(symbol) {
            return false;
        }
        let entry = &mut state.slots[slot.offset()];
        if !entry.owned {
            return false;
        }
        apply(entry);
        true
    }

    fn command(&self, symbol: &'static str, slot: Slot) -> Option<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.record(format!("{}({})", symbol, slot));
        if !state.bus_present || state.rejected.contains(symbol) {
            return None;
        }
        Some(state)
    }
}

impl MockState {
    fn record(&mut self, call: String) {
        if self.calls.len() == CALL_LOG_LIMIT {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

impl VirtualBus for MockBus {
    fn bus_exists(&self) -> bool {
        self.lock().bus_present
    }

    fn empty_slots(&self) -> Option<u8> {
        let state = self.lock();
        if !state.bus_present || state.rejected.contains("GetNumEmptyBusSlots") {
            return None;
        }
        Some(state.slots.iter().filter(|s| !s.plugged).count() as u8)
    }

    fn controller_exists(&self, slot: Slot) -> bool {
        let state = self.lock();
        state.bus_present && state.slots[slot.offset()].plugged
    }

    fn controller_owned(&self, slot: Slot) -> bool {
        let state = self.lock();
        state.bus_present && state.slots[slot.offset()].owned
    }

    fn plug_in(&self, slot: Slot) -> bool {
        let Some(mut state) = self.command("PlugIn", slot) else {
            return false;
        };
        let entry = &mut state.slots[slot.offset()];
        if entry.plugged {
            return false;
        }
        *entry = SlotState {
            plugged: true,
            owned: true,
            led: slot.index() as u8,
            ..SlotState::default()
        };
        true
    }

    fn unplug(&self, slot: Slot, force: bool) -> bool {
        let symbol = if force { "UnPlugForce" } else { "UnPlug" };
        let Some(mut state) = self.command(symbol, slot) else {
            return false;
        };
        let entry = &mut state.slots[slot.offset()];
        let allowed = if force { entry.plugged } else { entry.owned };
        if !allowed {
            return false;
        }
        *entry = SlotState::default();
        true
    }

    fn set_button(&self, slot: Slot, button: DigitalButton, pressed: bool) -> bool {
        self.feed(button.symbol(), slot, Some(pressed as i32), |entry| {
            if pressed {
                entry.pressed.insert(button);
            } else {
                entry.pressed.remove(&button);
            }
        })
    }

    fn set_trigger(&self, slot: Slot, trigger: Trigger, value: u8) -> bool {
        self.feed(trigger.symbol(), slot, Some(value as i32), |entry| match trigger {
            Trigger::Left => entry.left_trigger = value,
            Trigger::Right => entry.right_trigger = value,
        })
    }

    fn set_axis(&self, slot: Slot, axis: Axis, value: i16) -> bool {
        self.feed(axis.symbol(), slot, Some(value as i32), |entry| {
            entry.axes[axis.index()] = value
        })
    }

    fn set_dpad(&self, slot: Slot, direction: Option<DpadDirection>) -> bool {
        let symbol = direction.map_or(DpadDirection::OFF_SYMBOL, DpadDirection::symbol);
        self.feed(symbol, slot, None, |entry| entry.dpad = direction)
    }

    fn led_number(&self, slot: Slot) -> Option<u8> {
        let state = self.lock();
        let entry = &state.slots[slot.offset()];
        (state.bus_present && entry.plugged && !state.rejected.contains("GetLedNumber"))
            .then_some(entry.led)
    }

    fn vibration(&self, slot: Slot) -> Option<XInputVibration> {
        let state = self.lock();
        let entry = &state.slots[slot.offset()];
        (state.bus_present && entry.plugged && !state.rejected.contains("GetVibration"))
            .then_some(entry.vibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: u32) -> Slot {
        Slot::new(index).unwrap()
    }

    #[test]
    fn plug_in_takes_ownership() {
        let bus = MockBus::new();
        assert_eq!(bus.empty_slots(), Some(4));
        assert!(bus.plug_in(slot(2)));
        assert!(bus.controller_exists(slot(2)));
        assert!(bus.controller_owned(slot(2)));
        assert_eq!(bus.empty_slots(), Some(3));
        assert!(!bus.plug_in(slot(2)));
    }

    #[test]
    fn foreign_slot_needs_force_to_unplug() {
        let bus = MockBus::new();
        bus.occupy(slot(3));
        assert!(bus.controller_exists(slot(3)));
        assert!(!bus.controller_owned(slot(3)));
        assert!(!bus.unplug(slot(3), false));
        assert!(bus.unplug(slot(3), true));
        assert!(!bus.controller_exists(slot(3)));
    }

    #[test]
    fn feeding_requires_ownership() {
        let bus = MockBus::new();
        assert!(!bus.set_button(slot(1), DigitalButton::A, true));
        bus.plug_in(slot(1));
        assert!(bus.set_button(slot(1), DigitalButton::A, true));
        assert!(bus.slot_state(slot(1)).is_pressed(DigitalButton::A));
    }

    #[test]
    fn missing_bus_rejects_everything() {
        let bus = MockBus::without_bus();
        assert!(!bus.bus_exists());
        assert_eq!(bus.empty_slots(), None);
        assert!(!bus.plug_in(slot(1)));
        assert_eq!(bus.vibration(slot(1)), None);
    }

    #[test]
    fn rejected_symbols_fail_until_accepted() {
        let bus = MockBus::new();
        bus.plug_in(slot(1));
        bus.reject("SetAxisX");
        assert!(!bus.set_axis(slot(1), Axis::X, 10));
        assert!(bus.set_axis(slot(1), Axis::Y, 10));
        bus.accept("SetAxisX");
        assert!(bus.set_axis(slot(1), Axis::X, 10));
        assert_eq!(bus.slot_state(slot(1)).axis(Axis::X), 10);
    }

    #[test]
    fn calls_are_recorded_in_order() {
        let bus = MockBus::new();
        bus.plug_in(slot(1));
        bus.set_trigger(slot(1), Trigger::Left, 200);
        bus.set_dpad(slot(1), None);
        assert_eq!(
            bus.calls(),
            vec!["PlugIn(1)", "SetTriggerL(1, 200)", "SetDpadOff(1)"]
        );
    }

    #[test]
    fn call_log_keeps_only_the_newest() {
        let bus = MockBus::new();
        bus.plug_in(slot(1));
        for value in 0..CALL_LOG_LIMIT as i16 + 10 {
            bus.set_axis(slot(1), Axis::X, value);
        }
        let calls = bus.calls();
        assert_eq!(calls.len(), CALL_LOG_LIMIT);
        assert_eq!(calls[0], "SetAxisX(1, 10)");
        assert_eq!(calls.last().map(String::as_str), Some("SetAxisX(1, 1033)"));
    }

    #[test]
    fn removing_the_bus_keeps_slot_state() {
        let bus = MockBus::new();
        bus.plug_in(slot(2));
        bus.set_bus_present(false);
        assert!(!bus.controller_exists(slot(2)));
        assert!(!bus.unplug(slot(2), true));
        bus.set_bus_present(true);
        assert!(bus.controller_owned(slot(2)));
    }
}
