//! Shared utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

// ============================================================================
// FPS Counter
// ============================================================================

/// FPS counter with rolling average
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    last_frame: Instant,
    sample_count: usize,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_frame: Instant::now(),
            sample_count: sample_count.max(1),
        }
    }

    /// Call once per frame. Returns (delta_time, average_fps)
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.record(dt)
    }

    fn record(&mut self, dt: Duration) -> (f32, f32) {
        let dt = dt.as_secs_f32();
        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.sample_count {
            self.frame_times.pop_front();
        }

        let avg_dt = self.avg_frame_time_ms() / 1000.0;
        let avg_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        (dt, avg_fps)
    }

    /// Get the average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        let avg_dt: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32;
        avg_dt * 1000.0
    }

    /// Get min/max FPS from sample window
    pub fn min_max_fps(&self) -> (f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0);
        }
        let min_dt = self
            .frame_times
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        let max_dt = self.frame_times.iter().copied().fold(0.0, f32::max);
        let max_fps = if min_dt > 0.0 { 1.0 / min_dt } else { 0.0 };
        let min_fps = if max_dt > 0.0 { 1.0 / max_dt } else { 0.0 };
        (min_fps, max_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_rolling_window() {
        let mut fps = FpsCounter::new(2);
        fps.record(Duration::from_millis(100));
        let (dt, avg) = fps.record(Duration::from_millis(50));
        assert!((dt - 0.05).abs() < 1e-6);
        assert!((avg - 1.0 / 0.075).abs() < 0.01);

        // Oldest sample falls out of the window
        let (_, avg) = fps.record(Duration::from_millis(50));
        assert!((avg - 20.0).abs() < 0.01);
        assert!((fps.avg_frame_time_ms() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_fps_min_max() {
        let mut fps = FpsCounter::new(10);
        assert_eq!(fps.min_max_fps(), (0.0, 0.0));
        fps.record(Duration::from_millis(10));
        fps.record(Duration::from_millis(20));
        let (min, max) = fps.min_max_fps();
        assert!((min - 50.0).abs() < 0.01);
        assert!((max - 100.0).abs() < 0.01);
    }
}
