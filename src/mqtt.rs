//! MQTT client for remote favorite triggers
//!
//! Connects to an MQTT broker and subscribes to a topic. Every message is a
//! favorite event; it is parsed in the background thread and forwarded to
//! the main loop over a channel.

use crate::config::MqttConfig;
use crate::error::{AppError, Result};
use crate::math2d::Vec2;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const CLIENT_ID: &str = "heartburst";
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// A favorite action that should set off a burst
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteEvent {
    pub movie_id: Option<u64>,
    /// Burst centre; the window centre when absent
    pub position: Option<Vec2>,
}

/// JSON payload, every field optional
#[derive(Deserialize)]
struct FavoritePayload {
    movie_id: Option<u64>,
    x: Option<f32>,
    y: Option<f32>,
}

impl FavoriteEvent {
    /// Parse a payload: JSON object or any other non-empty text.
    /// A position needs both coordinates.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?.trim();
        if text.is_empty() {
            return None;
        }
        match serde_json::from_str::<FavoritePayload>(text) {
            Ok(json) => Some(Self {
                movie_id: json.movie_id,
                position: json.x.zip(json.y).map(|(x, y)| Vec2::new(x, y)),
            }),
            Err(_) => Some(Self::default()),
        }
    }
}

/// MQTT client that receives favorite events in a background thread
pub struct MqttClient {
    receiver: Receiver<FavoriteEvent>,
    _thread: thread::JoinHandle<()>,
}

impl MqttClient {
    /// Connect to the broker and subscribe.
    /// Fails immediately if the broker cannot be reached.
    pub fn new(config: &MqttConfig) -> Result<Self> {
        let mut options = MqttOptions::new(CLIENT_ID, config.host.as_str(), config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(config.topic.as_str(), QoS::AtMostOnce)
            .map_err(|source| AppError::MqttSubscribe {
                topic: config.topic.clone(),
                source,
            })?;

        // Poll once so an unreachable broker fails here, not in the thread
        let connect_error = |reason: String| AppError::MqttConnect {
            host: config.host.clone(),
            port: config.port,
            reason,
        };
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => return Err(connect_error(e.to_string())),
            None => return Err(connect_error("connection closed".to_string())),
        }

        let (sender, receiver) = mpsc::channel();
        let topic = config.topic.clone();
        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic);
        });

        info!(
            host = %config.host,
            port = config.port,
            topic = %config.topic,
            "MQTT connected"
        );

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: Connection, sender: Sender<FavoriteEvent>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                    let Some(favorite) = FavoriteEvent::parse(&publish.payload) else {
                        debug!("ignoring empty MQTT payload");
                        continue;
                    };
                    if sender.send(favorite).is_err() {
                        // Main thread gone
                        break;
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    // rumqttc reconnects on the next iteration
                    warn!(error = %e, "MQTT connection error");
                },
            }
        }
    }

    /// Drain every event received since the last poll (non-blocking)
    pub fn poll(&self) -> Vec<FavoriteEvent> {
        self.receiver.try_iter().collect()
    }
}
