#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid slot index. Range: 1 to 4 but was {0}")]
    InvalidSlot(u32),

    #[error("The virtual bus was not found. You can {action} vXbox devices only if the bus exists")]
    BusNotFound { action: &'static str },

    #[error("Driver rejected {call} for slot {slot}")]
    DriverRejected { call: &'static str, slot: u32 },

    #[error("Unable to get the vibration values of the rumble motors on slot {0}")]
    Vibration(u32),

    #[error("Failed to load vXboxInterface.dll: {0}")]
    LibraryLoad(String),

    #[error("vXboxInterface.dll does not export {0}")]
    MissingSymbol(&'static str),

    #[error("Unknown button name: {0}")]
    UnknownButton(String),

    #[error("Unknown axis name: {0}")]
    UnknownAxis(String),

    #[error("Script step {step} failed")]
    Script {
        step: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
