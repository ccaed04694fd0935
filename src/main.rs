mod burst;
mod cli;
mod config;
mod display;
mod error;
mod math2d;
mod mqtt;
mod particles;
mod renderer;
mod schedule;
mod util;

use burst::HeartBurst;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use display::{Canvas, Display, InputEvent, RenderTarget, Surface};
use error::Result;
use math2d::Vec2;
use mqtt::MqttClient;
use sdl2::keyboard::Keycode;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use util::FpsCounter;

const FPS_LOG_INTERVAL: Duration = Duration::from_secs(2);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heartburst=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// File settings first, then command line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = AppConfig::load(path)?;
            info!(path = %path.display(), "loaded config");
            config
        },
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    Ok(config)
}

/// Remote triggers are optional: a broker that is down is only a warning
fn connect_mqtt(config: &AppConfig) -> Option<MqttClient> {
    let mqtt = config.mqtt.as_ref().filter(|m| !m.host.is_empty())?;
    match MqttClient::new(mqtt) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "continuing without remote triggers");
            None
        },
    }
}

fn start_burst(burst: &mut HeartBurst, at: Vec2, movie_id: Option<u64>) {
    debug!(x = at.x, y = at.y, ?movie_id, "burst requested");
    burst.trigger(at, move || match movie_id {
        Some(id) => info!(movie_id = id, "favorite burst finished"),
        None => info!("burst finished"),
    });
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let (width, height) = (config.width, config.height);

    let (mut display, texture_creator) =
        Display::with_options("heartburst", width, height, config.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    let mut canvas = Canvas::with_background(width, height, config.background);

    let mut burst = HeartBurst::new(config.seed);
    let mqtt = connect_mqtt(&config);
    let centre = Vec2::new(display.width() as f32 / 2.0, display.height() as f32 / 2.0);

    let mut fps_counter = FpsCounter::new(60);
    let mut log_fps = false;
    let mut last_fps_log = Instant::now();

    info!(
        width,
        height,
        vsync = config.vsync,
        seed = ?config.seed,
        mqtt = mqtt.is_some(),
        "heartburst started"
    );
    info!("click or press Space to burst, F toggles FPS logging, Escape quits");

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::Space) => start_burst(&mut burst, centre, None),
                InputEvent::KeyDown(Keycode::F) => {
                    log_fps = !log_fps;
                    info!(enabled = log_fps, "FPS logging");
                },
                InputEvent::Click { x, y } => {
                    start_burst(&mut burst, Vec2::new(x as f32, y as f32), None);
                },
                InputEvent::KeyDown(_) => {},
            }
        }

        if let Some(mqtt) = &mqtt {
            for favorite in mqtt.poll() {
                start_burst(
                    &mut burst,
                    favorite.position.unwrap_or(centre),
                    favorite.movie_id,
                );
            }
        }

        burst.update(dt, canvas.height() as f32);
        if burst.is_visible() {
            burst.render(&mut canvas);
        } else {
            canvas.clear();
        }

        if log_fps && last_fps_log.elapsed() >= FPS_LOG_INTERVAL {
            let (min_fps, max_fps) = fps_counter.min_max_fps();
            info!(
                avg = avg_fps as u32,
                min = min_fps as u32,
                max = max_fps as u32,
                frame_ms = fps_counter.avg_frame_time_ms(),
                hearts = burst.particles().live_particles().len(),
                active = burst.is_active(),
                frame_loop = burst.frame_loop_running(),
                "fps"
            );
            last_fps_log = Instant::now();
        }

        display.present(&mut target, canvas.buffer())?;
    }

    info!("heartburst exiting");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        },
    }
}
