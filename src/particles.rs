//! Heart Particle System
//!
//! Owns the live hearts of one burst effect: creation with randomised
//! kinematics, per-frame physics and pruning.

use crate::config::{
    AIR_RESISTANCE, BURST_ANGLE_SPREAD, BURST_CENTER_SPREAD_X, BURST_CENTER_SPREAD_Y, GRAVITY,
    HEART_SIZE_MAX, HEART_SIZE_MIN, INITIAL_OPACITY, INITIAL_SPEED_MAX, INITIAL_SPEED_MIN,
    LIFE_DECAY, OFFSCREEN_MARGIN, ROTATION_SPEED_SPREAD,
};
use crate::math2d::Vec2;
use rand::Rng;
use tracing::trace;

/// A single heart glyph in flight
#[derive(Debug, Clone, PartialEq)]
pub struct Heart {
    /// List key only
    pub id: u64,
    pub pos: Vec2,
    /// Pixels per frame
    pub vel: Vec2,
    pub size: f32,
    pub opacity: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per frame
    pub rotation_speed: f32,
    /// 1.0 at spawn, removed once it reaches 0
    pub life: f32,
}

impl Heart {
    /// Check if heart is still alive
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Advance one frame
    fn step(&mut self, physics: &Physics) {
        self.pos += self.vel;
        self.vel.x *= physics.air_resistance;
        self.vel.y += physics.gravity;
        self.rotation += self.rotation_speed;
        // Shrinks by the life left before this frame's decay
        self.size *= 0.995 + self.life * 0.005;
        self.life -= physics.life_decay;
        // Fade-by-life is intentionally disabled; hearts stay fully opaque
        self.opacity = 1.0;
    }
}

/// Per-frame physics constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    /// Added to vertical velocity every frame
    pub gravity: f32,
    /// Horizontal velocity multiplier per frame
    pub air_resistance: f32,
    pub life_decay: f32,
    /// Distance below the surface at which hearts are dropped
    pub offscreen_margin: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            air_resistance: AIR_RESISTANCE,
            life_decay: LIFE_DECAY,
            offscreen_margin: OFFSCREEN_MARGIN,
        }
    }
}

/// Live heart collection for one effect invocation
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    hearts: Vec<Heart>,
    created: usize,
    physics: Physics,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            hearts: Vec::with_capacity(64),
            created: 0,
            physics: Physics::default(),
        }
    }

    /// Replace the physics constants
    #[cfg(test)]
    pub fn with_physics(mut self, physics: Physics) -> Self {
        self.physics = physics;
        self
    }

    /// Build a heart near `center` without registering it.
    ///
    /// The spawn offset is a rectangular jitter independent of the launch
    /// direction.
    pub fn create_particle<R: Rng + ?Sized>(&self, center: Vec2, rng: &mut R) -> Heart {
        let angle = rng.gen::<f32>() * BURST_ANGLE_SPREAD;
        let speed = rng.gen_range(INITIAL_SPEED_MIN..INITIAL_SPEED_MAX);
        let jitter = Vec2::new(
            (rng.gen::<f32>() - 0.5) * BURST_CENTER_SPREAD_X,
            (rng.gen::<f32>() - 0.5) * BURST_CENTER_SPREAD_Y,
        );

        Heart {
            id: rng.gen(),
            pos: center + jitter,
            vel: Vec2::new(angle.cos() * speed, angle.sin() * speed),
            size: rng.gen_range(HEART_SIZE_MIN..HEART_SIZE_MAX),
            opacity: INITIAL_OPACITY,
            rotation: rng.gen::<f32>() * 360.0,
            rotation_speed: (rng.gen::<f32>() - 0.5) * ROTATION_SPEED_SPREAD,
            life: 1.0,
        }
    }

    /// Register a heart and bump the creation counter
    pub fn add_particle(&mut self, heart: Heart) {
        self.hearts.push(heart);
        self.created += 1;
    }

    /// Step every heart one frame, then drop the expired and the fallen
    pub fn advance(&mut self, canvas_height: f32) {
        let physics = self.physics;
        for heart in &mut self.hearts {
            heart.step(&physics);
        }

        // retain keeps spawn order, which the renderer relies on for layering
        let floor = canvas_height + physics.offscreen_margin;
        self.hearts.retain(|heart| {
            let keep = heart.is_alive() && heart.pos.y <= floor;
            if !keep {
                trace!(id = heart.id, life = heart.life, y = heart.pos.y, "heart pruned");
            }
            keep
        });
    }

    /// Live hearts in spawn order
    pub fn live_particles(&self) -> &[Heart] {
        &self.hearts
    }

    /// Hearts ever added since the last reset
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Clear all hearts and the creation counter
    pub fn reset(&mut self) {
        self.hearts.clear();
        self.created = 0;
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}
