//! Application error type

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// SDL reports failures as plain strings
    #[error("SDL: {0}")]
    Sdl(String),

    #[error("config file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {} is not valid JSON: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to subscribe to MQTT topic '{topic}': {source}")]
    MqttSubscribe {
        topic: String,
        #[source]
        source: rumqttc::ClientError,
    },

    #[error("failed to connect to MQTT broker at {host}:{port}: {reason}")]
    MqttConnect {
        host: String,
        port: u16,
        reason: String,
    },
}

impl AppError {
    /// Wrap any displayable SDL-side error
    pub fn sdl(err: impl ToString) -> Self {
        Self::Sdl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
