//! Heart burst effect driver
//!
//! One `HeartBurst` owns a whole effect invocation: the particle system,
//! the spawn scheduler, the frame loop and the duration/fade-out timers.
//! The host calls `update` with wall-clock deltas and `render` once per
//! displayed frame.

use crate::config::{DURATION_MS, FADE_OUT_MS};
use crate::display::Surface;
use crate::math2d::Vec2;
use crate::particles::ParticleSystem;
use crate::renderer::HeartRenderer;
use crate::schedule::{BurstScheduler, FrameClock, Timer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

type Callback = Box<dyn FnOnce()>;

pub struct HeartBurst {
    system: ParticleSystem,
    renderer: HeartRenderer,
    scheduler: BurstScheduler,
    frames: FrameClock,
    duration: Timer,
    fade_out: Timer,
    rng: StdRng,
    on_end: Option<Callback>,
    /// Effect time in milliseconds
    now: f32,
    visible: bool,
}

impl HeartBurst {
    /// Create an idle effect. A seed makes every run reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            system: ParticleSystem::new(),
            renderer: HeartRenderer::new(),
            scheduler: BurstScheduler::default(),
            frames: FrameClock::default(),
            duration: Timer::default(),
            fade_out: Timer::default(),
            rng,
            on_end: None,
            now: 0.0,
            visible: false,
        }
    }

    #[cfg(test)]
    pub fn with_physics(mut self, physics: crate::particles::Physics) -> Self {
        self.system = std::mem::take(&mut self.system).with_physics(physics);
        self
    }

    #[cfg(test)]
    pub fn with_spawn_policy(mut self, policy: crate::schedule::SpawnPolicy) -> Self {
        self.scheduler = BurstScheduler::new(policy);
        self
    }

    /// Start a fresh burst at `center`.
    ///
    /// A burst already in flight is abandoned and its callback is dropped
    /// without being called. `on_end` runs once, after the fade-out.
    pub fn trigger<F>(&mut self, center: Vec2, on_end: F)
    where
        F: FnOnce() + 'static,
    {
        if self.on_end.is_some() {
            debug!("previous heart burst superseded");
        }
        self.cancel();
        self.system.reset();
        // Every deadline is relative to the trigger, so the clock restarts
        self.now = 0.0;

        let spawned = self
            .scheduler
            .start(self.now, center, &mut self.system, &mut self.rng);
        self.frames.start();
        self.duration.arm(self.now, DURATION_MS);
        self.on_end = Some(Box::new(on_end));
        self.visible = true;

        debug!(x = center.x, y = center.y, spawned, "heart burst triggered");
    }

    /// Advance the effect by `dt` seconds of wall time
    pub fn update(&mut self, dt: f32, surface_height: f32) {
        if !self.is_active() {
            return;
        }
        let dt_ms = dt.max(0.0) * 1000.0;
        self.now += dt_ms;

        self.scheduler
            .poll(self.now, &mut self.system, &mut self.rng);

        for _ in 0..self.frames.advance(dt_ms) {
            // Surface not laid out yet: keep ticking, move nothing
            if surface_height > 0.0 {
                self.system.advance(surface_height);
            }
            if self.system.live_particles().is_empty() {
                self.frames.stop();
                debug!(
                    spawning = self.scheduler.is_active(),
                    "frame loop idle, no live hearts"
                );
                break;
            }
        }

        if let Some(at) = self.duration.fire(self.now) {
            self.visible = false;
            self.fade_out.arm(at, FADE_OUT_MS);
            debug!("heart burst hidden, fading out");
        }

        if self.fade_out.fire(self.now).is_some() {
            let on_end = self.on_end.take();
            self.cancel();
            if let Some(on_end) = on_end {
                on_end();
            }
            debug!(bursts = self.scheduler.bursts_fired(), "heart burst finished");
        }
    }

    /// Paint the live hearts, replacing whatever the surface held
    pub fn render(&self, surface: &mut dyn Surface) {
        if !self.visible || surface.width() == 0 || surface.height() == 0 {
            return;
        }
        surface.clear();
        for heart in self.system.live_particles() {
            self.renderer.draw(surface, heart);
        }
    }

    /// Stop every timing source and forget the pending callback
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
        self.frames.stop();
        self.duration.cancel();
        self.fade_out.cancel();
        self.on_end = None;
        self.visible = false;
    }

    /// True from trigger until the callback has run
    pub fn is_active(&self) -> bool {
        self.duration.is_armed() || self.fade_out.is_armed()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame_loop_running(&self) -> bool {
        self.frames.is_running()
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.system
    }
}

impl Default for HeartBurst {
    fn default() -> Self {
        Self::new(None)
    }
}
