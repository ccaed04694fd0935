//! Virtual-time scheduling
//!
//! The effect runs on one thread. Timers here are deadlines in effect
//! milliseconds, polled from the frame loop instead of firing callbacks,
//! so cancelling one is just disarming it.

use crate::config::{
    BATCH_SIZE_MAX, BATCH_SIZE_MIN, BURST_INTERVAL_MAX_MS, BURST_INTERVAL_MIN_MS, FRAME_MS,
    HEART_COUNT, MAX_CATCH_UP_FRAMES,
};
use crate::math2d::Vec2;
use crate::particles::ParticleSystem;
use rand::Rng;
use tracing::trace;

// ============================================================================
// Timer
// ============================================================================

/// One-shot deadline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer {
    deadline: Option<f32>,
}

impl Timer {
    pub fn arm(&mut self, now: f32, delay_ms: f32) {
        self.deadline = Some(now + delay_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[cfg(test)]
    pub fn deadline(&self) -> Option<f32> {
        self.deadline
    }

    /// Returns the deadline and disarms if it has passed
    pub fn fire(&mut self, now: f32) -> Option<f32> {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                Some(at)
            },
            _ => None,
        }
    }
}

// ============================================================================
// FrameClock
// ============================================================================

/// Fixed-tick frame scheduler.
///
/// Accumulates wall time and hands out whole ticks, so physics expressed in
/// pixels per frame behaves the same with or without vsync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    step_ms: f32,
    max_catch_up: u32,
    accumulator: f32,
    running: bool,
}

impl FrameClock {
    pub fn new(step_ms: f32, max_catch_up: u32) -> Self {
        Self {
            step_ms,
            max_catch_up: max_catch_up.max(1),
            accumulator: 0.0,
            running: false,
        }
    }

    /// Start ticking; the first tick is due immediately
    pub fn start(&mut self) {
        self.running = true;
        self.accumulator = self.step_ms;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add elapsed time and return how many ticks are due.
    /// Backlog beyond the catch-up limit is dropped.
    pub fn advance(&mut self, dt_ms: f32) -> u32 {
        if !self.running {
            return 0;
        }
        self.accumulator += dt_ms.max(0.0);
        let due = (self.accumulator / self.step_ms).floor() as u32;
        if due > self.max_catch_up {
            self.accumulator = 0.0;
            return self.max_catch_up;
        }
        self.accumulator -= due as f32 * self.step_ms;
        due
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_MS, MAX_CATCH_UP_FRAMES)
    }
}

// ============================================================================
// Burst Scheduler
// ============================================================================

/// How many hearts to create, in what batches, how far apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPolicy {
    pub target: usize,
    pub batch_min: usize,
    pub batch_max: usize,
    pub delay_min_ms: f32,
    pub delay_max_ms: f32,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            target: HEART_COUNT,
            batch_min: BATCH_SIZE_MIN,
            batch_max: BATCH_SIZE_MAX,
            delay_min_ms: BURST_INTERVAL_MIN_MS,
            delay_max_ms: BURST_INTERVAL_MAX_MS,
        }
    }
}

/// Emits irregular batches of hearts until the cumulative target is hit.
///
/// Stops permanently once `created_count()` reaches the target, even if
/// hearts die off afterwards.
#[derive(Debug, Clone)]
pub struct BurstScheduler {
    policy: SpawnPolicy,
    center: Vec2,
    next_burst: Timer,
    bursts: usize,
}

impl BurstScheduler {
    /// Every batch holds at least one heart, so each run ends at the target
    pub fn new(policy: SpawnPolicy) -> Self {
        let batch_min = policy.batch_min.max(1);
        let delay_min_ms = policy.delay_min_ms.max(0.0);
        let policy = SpawnPolicy {
            batch_min,
            batch_max: policy.batch_max.max(batch_min),
            delay_min_ms,
            delay_max_ms: policy.delay_max_ms.max(delay_min_ms),
            ..policy
        };
        Self {
            policy,
            center: Vec2::ZERO,
            next_burst: Timer::default(),
            bursts: 0,
        }
    }

    #[cfg(test)]
    pub fn policy(&self) -> &SpawnPolicy {
        &self.policy
    }

    /// Begin a new run at `center`, firing the first batch immediately
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        now: f32,
        center: Vec2,
        system: &mut ParticleSystem,
        rng: &mut R,
    ) -> usize {
        self.center = center;
        self.bursts = 0;
        self.next_burst.arm(now, 0.0);
        self.poll(now, system, rng)
    }

    /// Fire every batch that is due. Follow-ups are scheduled from the
    /// previous deadline, so a slow frame does not stretch the cadence.
    /// Returns the number of hearts created.
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        now: f32,
        system: &mut ParticleSystem,
        rng: &mut R,
    ) -> usize {
        let mut spawned = 0;
        while let Some(at) = self.next_burst.fire(now) {
            spawned += self.burst(at, system, rng);
        }
        spawned
    }

    fn burst<R: Rng + ?Sized>(
        &mut self,
        at: f32,
        system: &mut ParticleSystem,
        rng: &mut R,
    ) -> usize {
        let created = system.created_count();
        if created >= self.policy.target {
            return 0;
        }

        let batch = rng
            .gen_range(self.policy.batch_min..=self.policy.batch_max)
            .min(self.policy.target - created);
        for _ in 0..batch {
            let heart = system.create_particle(self.center, rng);
            system.add_particle(heart);
        }
        self.bursts += 1;

        let delay = if self.policy.delay_max_ms > self.policy.delay_min_ms {
            rng.gen_range(self.policy.delay_min_ms..self.policy.delay_max_ms)
        } else {
            self.policy.delay_min_ms
        };
        self.next_burst.arm(at, delay);

        trace!(
            batch,
            total = system.created_count(),
            next_in_ms = delay,
            "heart batch spawned"
        );
        batch
    }

    pub fn cancel(&mut self) {
        self.next_burst.cancel();
    }

    /// True while another batch is pending
    pub fn is_active(&self) -> bool {
        self.next_burst.is_armed()
    }

    /// Batches fired since the last `start`
    pub fn bursts_fired(&self) -> usize {
        self.bursts
    }
}

impl Default for BurstScheduler {
    fn default() -> Self {
        Self::new(SpawnPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Drive the scheduler in 1 ms steps until it goes idle
    fn run_to_completion(
        scheduler: &mut BurstScheduler,
        system: &mut ParticleSystem,
        rng: &mut StdRng,
    ) -> f32 {
        let target = scheduler.policy().target;
        let mut now = 0.0;
        scheduler.start(now, Vec2::new(100.0, 100.0), system, rng);
        assert!(system.created_count() <= target);
        while scheduler.is_active() {
            now += 1.0;
            scheduler.poll(now, system, rng);
            assert!(system.created_count() <= target);
            assert!(now < 100_000.0, "scheduler never stopped");
        }
        now
    }

    #[test]
    fn test_timer_fires_once() {
        let mut timer = Timer::default();
        assert!(!timer.is_armed());
        timer.arm(100.0, 50.0);
        assert_eq!(timer.fire(149.0), None);
        assert_eq!(timer.fire(150.0), Some(150.0));
        assert_eq!(timer.fire(500.0), None);
    }

    #[test]
    fn test_timer_cancel() {
        let mut timer = Timer::default();
        timer.arm(0.0, 10.0);
        timer.cancel();
        assert_eq!(timer.fire(1000.0), None);
    }

    #[test]
    fn test_frame_clock_ticks() {
        let mut clock = FrameClock::new(10.0, 4);
        assert_eq!(clock.advance(100.0), 0);

        clock.start();
        assert_eq!(clock.advance(0.0), 1);
        assert_eq!(clock.advance(5.0), 0);
        assert_eq!(clock.advance(5.0), 1);
        assert_eq!(clock.advance(25.0), 2);
        assert_eq!(clock.advance(5.0), 1);
    }

    #[test]
    fn test_frame_clock_drops_long_backlog() {
        let mut clock = FrameClock::new(10.0, 4);
        clock.start();
        assert_eq!(clock.advance(1000.0), 4);
        assert_eq!(clock.advance(5.0), 0);
        clock.stop();
        assert_eq!(clock.advance(1000.0), 0);
    }

    #[test]
    fn test_first_batch_is_immediate() {
        let mut system = ParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut scheduler = BurstScheduler::default();

        let spawned = scheduler.start(0.0, Vec2::ZERO, &mut system, &mut rng);
        assert!((BATCH_SIZE_MIN..=BATCH_SIZE_MAX).contains(&spawned));
        assert_eq!(system.created_count(), spawned);
        assert_eq!(scheduler.bursts_fired(), 1);

        let next = scheduler.next_burst.deadline().unwrap();
        assert!((BURST_INTERVAL_MIN_MS..BURST_INTERVAL_MAX_MS).contains(&next));
    }

    #[test]
    fn test_count_bound_for_many_policies() {
        for (seed, (target, lo, hi)) in [(1, 1, 1), (7, 2, 5), (20, 2, 5), (33, 4, 4), (50, 1, 9)]
            .into_iter()
            .enumerate()
        {
            let policy = SpawnPolicy {
                target,
                batch_min: lo,
                batch_max: hi,
                ..SpawnPolicy::default()
            };
            let mut system = ParticleSystem::new();
            let mut rng = StdRng::seed_from_u64(seed as u64);
            let mut scheduler = BurstScheduler::new(policy);
            run_to_completion(&mut scheduler, &mut system, &mut rng);
            assert_eq!(system.created_count(), target);
        }
    }

    #[test]
    fn test_twenty_hearts_in_four_to_ten_bursts() {
        for seed in 0..50 {
            let mut system = ParticleSystem::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut scheduler = BurstScheduler::new(SpawnPolicy {
                target: 20,
                batch_min: 2,
                batch_max: 5,
                ..SpawnPolicy::default()
            });
            run_to_completion(&mut scheduler, &mut system, &mut rng);

            assert_eq!(system.created_count(), 20);
            assert!((4..=10).contains(&scheduler.bursts_fired()));
        }
    }

    #[test]
    fn test_does_not_resume_after_hearts_die() {
        let mut system = ParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut scheduler = BurstScheduler::default();
        let end = run_to_completion(&mut scheduler, &mut system, &mut rng);

        // Every heart falls below a very short surface
        system.advance(-10_000.0);
        assert!(system.live_particles().is_empty());
        assert_eq!(scheduler.poll(end + 10_000.0, &mut system, &mut rng), 0);
        assert_eq!(system.created_count(), HEART_COUNT);
    }

    #[test]
    fn test_long_gap_keeps_cadence() {
        let mut system = ParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut scheduler = BurstScheduler::default();
        scheduler.start(0.0, Vec2::ZERO, &mut system, &mut rng);

        // One huge step catches up on every pending batch
        scheduler.poll(10_000.0, &mut system, &mut rng);
        assert_eq!(system.created_count(), HEART_COUNT);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_empty_batches_and_zero_delay_still_finish() {
        let mut system = ParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(21);
        let mut scheduler = BurstScheduler::new(SpawnPolicy {
            target: 6,
            batch_min: 0,
            batch_max: 0,
            delay_min_ms: 0.0,
            delay_max_ms: -5.0,
        });
        assert_eq!(scheduler.policy().batch_min, 1);
        assert_eq!(scheduler.policy().batch_max, 1);

        // Zero delay: every batch is due at once
        let spawned = scheduler.start(0.0, Vec2::ZERO, &mut system, &mut rng);
        assert_eq!(spawned, 6);
        assert_eq!(scheduler.bursts_fired(), 6);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_inverted_batch_range_is_widened() {
        let scheduler = BurstScheduler::new(SpawnPolicy {
            batch_min: 4,
            batch_max: 2,
            ..SpawnPolicy::default()
        });
        assert_eq!(scheduler.policy().batch_max, 4);
    }

    #[test]
    fn test_cancel_stops_spawning() {
        let mut system = ParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut scheduler = BurstScheduler::default();
        let first = scheduler.start(0.0, Vec2::ZERO, &mut system, &mut rng);
        scheduler.cancel();
        assert_eq!(scheduler.poll(10_000.0, &mut system, &mut rng), 0);
        assert_eq!(system.created_count(), first);
    }
}
