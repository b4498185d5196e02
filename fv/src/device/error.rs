//! Device error types

use thiserror::Error;

/// Errors from the audio endpoint
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to open device {target}: {reason}")]
    Open { target: String, reason: String },

    #[error("Failed to read volume: {0}")]
    Read(String),

    #[error("Failed to set volume to {level}: {reason}")]
    Write { level: f32, reason: String },

    #[error("Unexpected output from {program}: {output}")]
    Parse { program: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
