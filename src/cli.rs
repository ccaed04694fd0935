//! Command line interface

use crate::config::{AppConfig, MqttConfig, Resolution};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "heartburst", version, about = "Heart burst effect for favorite actions")]
#[command(after_help = "Controls:\n  Left click  Burst at the cursor\n  Space       Burst at the window centre\n  F           Toggle FPS logging\n  Escape      Quit")]
pub struct Cli {
    /// Window width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Window size as WxH, e.g. 1280x720 (overrides --width/--height)
    #[arg(short, long, value_name = "WxH")]
    pub resolution: Option<Resolution>,

    /// Disable VSync for an uncapped frame rate
    #[arg(long)]
    pub no_vsync: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// MQTT broker host; enables remote triggers
    #[arg(long, value_name = "HOST")]
    pub mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long, value_name = "PORT")]
    pub mqtt_port: Option<u16>,

    /// MQTT topic carrying favorite events
    #[arg(long, value_name = "TOPIC")]
    pub mqtt_topic: Option<String>,

    /// Seed for reproducible bursts
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Overlay command line flags on top of file settings
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(res) = self.resolution {
            config.width = res.width;
            config.height = res.height;
        }
        if self.no_vsync {
            config.vsync = false;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        if let Some(host) = &self.mqtt_host {
            config.mqtt.get_or_insert_with(MqttConfig::default).host = host.clone();
        }
        // Port and topic only matter once a broker is known
        if let Some(mqtt) = config.mqtt.as_mut() {
            if let Some(port) = self.mqtt_port {
                mqtt.port = port;
            }
            if let Some(topic) = &self.mqtt_topic {
                mqtt.topic = topic.clone();
            }
        }
    }
}
