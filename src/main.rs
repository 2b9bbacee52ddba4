use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use vxbox::config::{Backend, FeederConfig};
use vxbox::driver::MockBus;
use vxbox::{load_script, run_script, VirtualBus, VirtualXboxController};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(FeederConfig::config_path);
    let config = FeederConfig::load_or_default(&config_path);

    let bus = open_bus(&config)?;
    match bus.empty_slots() {
        Some(n) => log::info!("Virtual bus has {} empty slots", n),
        None => log::warn!("Could not query empty bus slots"),
    }

    let mut controller =
        VirtualXboxController::new(Arc::clone(&bus), config.slot, config.force_ownership)
            .with_context(|| format!("Failed to plug in slot {}", config.slot))?;
    controller.set_release_delay(config.release_delay());

    if let Ok(led) = controller.led_number() {
        log::info!("Slot {} shows LED {}", controller.slot(), led);
    }

    let steps = match &config.script_file {
        Some(path) => load_script(path)
            .with_context(|| format!("Failed to load script {:?}", path))?,
        None => config.script.clone(),
    };
    run_script(&controller, &steps).context("Script failed")?;

    if let Some(duration) = config.watch_rumble() {
        log::info!("Watching rumble for {:?}", duration);
        let (monitor, rumble_rx) = controller.watch_rumble(config.rumble_poll_interval());
        let deadline = Instant::now() + duration;
        while let Ok(rumble) = rumble_rx.recv_deadline(deadline) {
            log::info!(
                "Rumble: large={:.2}, small={:.2}",
                rumble.large_motor,
                rumble.small_motor
            );
        }
        drop(monitor);
    }

    Ok(())
}

fn open_bus(config: &FeederConfig) -> anyhow::Result<Arc<dyn VirtualBus>> {
    match config.backend {
        Backend::Mock => {
            log::info!("Using in-memory mock bus");
            Ok(Arc::new(MockBus::new()))
        }
        Backend::Driver => open_driver(config.dll_path.as_deref()),
    }
}

#[cfg(windows)]
fn open_driver(dll_path: Option<&Path>) -> anyhow::Result<Arc<dyn VirtualBus>> {
    use vxbox::driver::VXboxInterface;

    let interface = match dll_path {
        Some(path) => VXboxInterface::load_from(path)?,
        None => VXboxInterface::load()?,
    };
    if !interface.bus_exists() {
        anyhow::bail!(
            "ScpVBus not found. Install the virtual bus driver before plugging in vXbox devices"
        );
    }
    Ok(Arc::new(interface))
}

#[cfg(not(windows))]
fn open_driver(_dll_path: Option<&Path>) -> anyhow::Result<Arc<dyn VirtualBus>> {
    anyhow::bail!("vXboxInterface.dll is only available on Windows; set \"backend\": \"mock\" in the config")
}
