use crate::button::{Axis, Button};
use crate::script::Step;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILENAME: &str = "vxbox_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// vXboxInterface.dll on ScpVBus
    #[default]
    Driver,
    /// In-memory bus, for trying scripts without the driver
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    pub backend: Backend,
    /// Explicit location of vXboxInterface.dll, otherwise the DLL search path is used
    pub dll_path: Option<PathBuf>,
    /// Bus slot, 1 to 4
    pub slot: u32,
    pub force_ownership: bool,
    pub release_delay_ms: u64,
    pub rumble_poll_ms: u64,
    /// How long to report rumble after the script finishes, 0 to skip
    pub watch_rumble_ms: u64,
    pub script: Vec<Step>,
    /// JSON file of steps to run instead of `script`
    pub script_file: Option<PathBuf>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Driver,
            dll_path: None,
            slot: 1,
            force_ownership: false,
            release_delay_ms: 100,
            rumble_poll_ms: 50,
            watch_rumble_ms: 0,
            script: vec![
                Step::Stroke {
                    button: Button::A,
                    times: 1,
                },
                Step::Axis {
                    axis: Axis::X,
                    value: 32767,
                },
                Step::Wait { ms: 250 },
                Step::Reset,
            ],
            script_file: None,
        }
    }
}

impl FeederConfig {
    pub fn load(path: &Path) -> Option<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {:?}", path);
                        return Some(config);
                    }
                    Err(e) => {
                        log::error!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    log::error!("Failed to read config file: {}", e);
                }
            }
        }
        None
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|| {
            log::info!("Using default config");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// `vxbox_config.json` next to the executable
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILENAME)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }

    pub fn rumble_poll_interval(&self) -> Duration {
        Duration::from_millis(self.rumble_poll_ms.max(1))
    }

    pub fn watch_rumble(&self) -> Option<Duration> {
        (self.watch_rumble_ms > 0).then(|| Duration::from_millis(self.watch_rumble_ms))
    }
}
