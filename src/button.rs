use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical buttons of an Xbox 360 pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    LeftStick,
    RightStick,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Guide,
}

/// The driver call family a logical button is fed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Digital(DigitalButton),
    Trigger(Trigger),
    Dpad(DpadDirection),
}

/// Buttons the driver exposes as on/off setters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalButton {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    Guide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

/// The d-pad holds a single direction at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DpadDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left stick horizontal
    X,
    /// Left stick vertical
    Y,
    /// Right stick horizontal
    Rx,
    /// Right stick vertical
    Ry,
}

impl Button {
    pub const ALL: [Button; 17] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Start,
        Button::Back,
        Button::LeftStick,
        Button::RightStick,
        Button::LeftBumper,
        Button::RightBumper,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Guide,
    ];

    pub fn control(self) -> Control {
        match self {
            Button::A => Control::Digital(DigitalButton::A),
            Button::B => Control::Digital(DigitalButton::B),
            Button::X => Control::Digital(DigitalButton::X),
            Button::Y => Control::Digital(DigitalButton::Y),
            Button::Start => Control::Digital(DigitalButton::Start),
            Button::Back => Control::Digital(DigitalButton::Back),
            Button::LeftStick => Control::Digital(DigitalButton::LeftThumb),
            Button::RightStick => Control::Digital(DigitalButton::RightThumb),
            Button::LeftBumper => Control::Digital(DigitalButton::LeftShoulder),
            Button::RightBumper => Control::Digital(DigitalButton::RightShoulder),
            Button::Guide => Control::Digital(DigitalButton::Guide),
            Button::LeftTrigger => Control::Trigger(Trigger::Left),
            Button::RightTrigger => Control::Trigger(Trigger::Right),
            Button::DpadUp => Control::Dpad(DpadDirection::Up),
            Button::DpadDown => Control::Dpad(DpadDirection::Down),
            Button::DpadLeft => Control::Dpad(DpadDirection::Left),
            Button::DpadRight => Control::Dpad(DpadDirection::Right),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::Start => "start",
            Button::Back => "back",
            Button::LeftStick => "left_stick",
            Button::RightStick => "right_stick",
            Button::LeftBumper => "left_bumper",
            Button::RightBumper => "right_bumper",
            Button::LeftTrigger => "left_trigger",
            Button::RightTrigger => "right_trigger",
            Button::DpadUp => "dpad_up",
            Button::DpadDown => "dpad_down",
            Button::DpadLeft => "dpad_left",
            Button::DpadRight => "dpad_right",
            Button::Guide => "guide",
        }
    }
}

impl DigitalButton {
    /// Name of the driver export that feeds this button
    pub fn symbol(self) -> &'static str {
        match self {
            DigitalButton::A => "SetBtnA",
            DigitalButton::B => "SetBtnB",
            DigitalButton::X => "SetBtnX",
            DigitalButton::Y => "SetBtnY",
            DigitalButton::Start => "SetBtnStart",
            DigitalButton::Back => "SetBtnBack",
            // LT/RT in the driver are the thumbstick clicks, not the triggers
            DigitalButton::LeftThumb => "SetBtnLT",
            DigitalButton::RightThumb => "SetBtnRT",
            DigitalButton::LeftShoulder => "SetBtnLB",
            DigitalButton::RightShoulder => "SetBtnRB",
            DigitalButton::Guide => "SetBtnGD",
        }
    }
}

impl Trigger {
    pub fn symbol(self) -> &'static str {
        match self {
            Trigger::Left => "SetTriggerL",
            Trigger::Right => "SetTriggerR",
        }
    }
}

impl DpadDirection {
    pub const OFF_SYMBOL: &'static str = "SetDpadOff";

    pub fn symbol(self) -> &'static str {
        match self {
            DpadDirection::Up => "SetDpadUp",
            DpadDirection::Down => "SetDpadDown",
            DpadDirection::Left => "SetDpadLeft",
            DpadDirection::Right => "SetDpadRight",
        }
    }
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Rx, Axis::Ry];

    pub fn symbol(self) -> &'static str {
        match self {
            Axis::X => "SetAxisX",
            Axis::Y => "SetAxisY",
            Axis::Rx => "SetAxisRx",
            Axis::Ry => "SetAxisRy",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Rx => "rx",
            Axis::Ry => "ry",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Rx => 2,
            Axis::Ry => 3,
        }
    }
}

/// Lowercase and drop separators so "LeftStick", "left-stick" and "left_stick" all match
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Button {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Button::ALL
            .into_iter()
            .find(|b| normalize(b.name()) == wanted)
            .ok_or_else(|| Error::UnknownButton(s.to_string()))
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Axis::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| Error::UnknownAxis(s.to_string()))
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbstick_clicks_use_lt_rt_exports() {
        assert_eq!(Button::LeftStick.control(), Control::Digital(DigitalButton::LeftThumb));
        assert_eq!(DigitalButton::LeftThumb.symbol(), "SetBtnLT");
        assert_eq!(DigitalButton::RightThumb.symbol(), "SetBtnRT");
    }

    #[test]
    fn triggers_are_analog() {
        assert_eq!(Button::LeftTrigger.control(), Control::Trigger(Trigger::Left));
        assert_eq!(Button::RightTrigger.control(), Control::Trigger(Trigger::Right));
    }

    #[test]
    fn dpad_buttons_map_to_directions() {
        assert_eq!(Button::DpadUp.control(), Control::Dpad(DpadDirection::Up));
        assert_eq!(Button::DpadLeft.control(), Control::Dpad(DpadDirection::Left));
    }

    #[test]
    fn all_buttons_are_distinct() {
        let unique: std::collections::HashSet<_> = Button::ALL.iter().collect();
        assert_eq!(unique.len(), Button::ALL.len());
    }

    #[test]
    fn parse_accepts_several_spellings() {
        assert_eq!("LeftStick".parse::<Button>().unwrap(), Button::LeftStick);
        assert_eq!("left_stick".parse::<Button>().unwrap(), Button::LeftStick);
        assert_eq!("DPAD-UP".parse::<Button>().unwrap(), Button::DpadUp);
        assert_eq!("a".parse::<Button>().unwrap(), Button::A);
        assert_eq!("RX".parse::<Axis>().unwrap(), Axis::Rx);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(matches!("turbo".parse::<Button>(), Err(Error::UnknownButton(_))));
        assert!(matches!("z".parse::<Axis>(), Err(Error::UnknownAxis(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for button in Button::ALL {
            assert_eq!(button.to_string().parse::<Button>().unwrap(), button);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Button::RightBumper).unwrap();
        assert_eq!(json, "\"right_bumper\"");
        let axis: Axis = serde_json::from_str("\"ry\"").unwrap();
        assert_eq!(axis, Axis::Ry);
    }
}
