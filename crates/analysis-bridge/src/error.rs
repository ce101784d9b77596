//! Bridge error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Failed to spawn engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine exited")]
    EngineExited,

    #[error("Request superseded by a newer one")]
    Superseded,
}
