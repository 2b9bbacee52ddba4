use crate::button::{Axis, Button};
use crate::controller::{VirtualXboxController, TRIGGER_MAX};
use crate::driver::VirtualBus;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One scripted action against a controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Press {
        button: Button,
        #[serde(default = "full_pressure")]
        pressure: u8,
    },
    Release {
        button: Button,
    },
    Stroke {
        button: Button,
        #[serde(default = "once")]
        times: u32,
    },
    Chord {
        modifier: Button,
        buttons: Vec<Button>,
    },
    Axis {
        axis: Axis,
        value: i32,
    },
    Reset,
    Wait {
        ms: u64,
    },
}

fn full_pressure() -> u8 {
    TRIGGER_MAX
}

fn once() -> u32 {
    1
}

impl Step {
    pub fn apply<B: VirtualBus + ?Sized>(&self, controller: &VirtualXboxController<B>) -> Result<()> {
        match self {
            Step::Press { button, pressure } => controller.press_with(*button, *pressure),
            Step::Release { button } => controller.release_button(*button),
            Step::Stroke { button, times } => controller.stroke_times(*button, *times),
            Step::Chord { modifier, buttons } => controller.stroke_chord(*modifier, buttons),
            Step::Axis { axis, value } => controller.set_axis(*axis, *value),
            Step::Reset => controller.reset(),
            Step::Wait { ms } => {
                std::thread::sleep(Duration::from_millis(*ms));
                Ok(())
            }
        }
    }
}

/// Reads a JSON array of steps
pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let contents = std::fs::read_to_string(path)?;
    let steps: Vec<Step> = serde_json::from_str(&contents)?;
    log::info!("Loaded {} script steps from {:?}", steps.len(), path);
    Ok(steps)
}

/// Runs the steps in order and stops at the first one that fails
pub fn run_script<B: VirtualBus + ?Sized>(
    controller: &VirtualXboxController<B>,
    steps: &[Step],
) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        log::debug!("Slot {} step {}: {:?}", controller.slot(), i, step);
        step.apply(controller).map_err(|e| Error::Script {
            step: i,
            source: Box::new(e),
        })?;
    }
    log::info!("Ran {} script steps on slot {}", steps.len(), controller.slot());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::{DigitalButton, Trigger};
    use crate::driver::{MockBus, Slot};
    use std::sync::Arc;

    fn controller() -> (Arc<MockBus>, VirtualXboxController<MockBus>) {
        let bus = Arc::new(MockBus::new());
        let mut controller = VirtualXboxController::new(Arc::clone(&bus), 1, false).unwrap();
        controller.set_release_delay(Duration::ZERO);
        bus.clear_calls();
        (bus, controller)
    }

    #[test]
    fn parses_json_steps_with_defaults() {
        let json = r#"[
            {"op": "press", "button": "left_trigger", "pressure": 64},
            {"op": "press", "button": "a"},
            {"op": "stroke", "button": "b"},
            {"op": "chord", "modifier": "left_bumper", "buttons": ["x", "y"]},
            {"op": "axis", "axis": "rx", "value": -40000},
            {"op": "wait", "ms": 1},
            {"op": "reset"}
        ]"#;
        let steps: Vec<Step> = serde_json::from_str(json).unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(
            steps[1],
            Step::Press {
                button: Button::A,
                pressure: 255
            }
        );
        assert_eq!(
            steps[2],
            Step::Stroke {
                button: Button::B,
                times: 1
            }
        );
    }

    #[test]
    fn runs_steps_against_the_controller() {
        let (bus, controller) = controller();
        let steps = vec![
            Step::Press {
                button: Button::LeftTrigger,
                pressure: 64,
            },
            Step::Press {
                button: Button::A,
                pressure: 255,
            },
            Step::Axis {
                axis: Axis::Rx,
                value: -40000,
            },
        ];
        run_script(&controller, &steps).unwrap();

        let state = bus.slot_state(Slot::new(1).unwrap());
        assert_eq!(state.trigger(Trigger::Left), 64);
        assert!(state.is_pressed(DigitalButton::A));
        assert_eq!(state.axis(Axis::Rx), i16::MIN);
    }

    #[test]
    fn failure_names_the_step() {
        let (bus, controller) = controller();
        bus.reject("SetBtnY");
        let steps = vec![
            Step::Stroke {
                button: Button::X,
                times: 2,
            },
            Step::Stroke {
                button: Button::Y,
                times: 1,
            },
            Step::Reset,
        ];
        let err = run_script(&controller, &steps).unwrap_err();
        match err {
            Error::Script { step, source } => {
                assert_eq!(step, 1);
                assert!(matches!(*source, Error::DriverRejected { call: "SetBtnY", .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Reset never ran
        assert!(!bus.calls().iter().any(|c| c.starts_with("SetAxis")));
    }

    #[test]
    fn failure_message_leaves_the_cause_to_the_chain() {
        let (bus, controller) = controller();
        bus.reject("SetDpadOff");
        let steps = vec![Step::Release {
            button: Button::DpadDown,
        }];
        let err = run_script(&controller, &steps).unwrap_err();
        assert_eq!(err.to_string(), "Script step 0 failed");
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("Driver rejected SetDpadOff for slot 1"));
    }

    #[test]
    fn loads_steps_from_a_file() {
        let path = std::env::temp_dir().join(format!("vxbox-{}-steps.json", std::process::id()));
        std::fs::write(&path, r#"[{"op": "stroke", "button": "dpad_up", "times": 2}, {"op": "reset"}]"#)
            .unwrap();
        let steps = load_script(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(
            steps,
            vec![
                Step::Stroke {
                    button: Button::DpadUp,
                    times: 2
                },
                Step::Reset
            ]
        );
    }

    #[test]
    fn bad_script_files_are_reported() {
        let missing = std::env::temp_dir().join(format!("vxbox-{}-missing-steps.json", std::process::id()));
        assert!(matches!(load_script(&missing), Err(Error::Io(_))));

        let broken = std::env::temp_dir().join(format!("vxbox-{}-broken-steps.json", std::process::id()));
        std::fs::write(&broken, r#"[{"op": "jump"}]"#).unwrap();
        let result = load_script(&broken);
        std::fs::remove_file(&broken).ok();
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
