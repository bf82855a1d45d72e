//! Frame statistics, reported through the log instead of an on-screen
//! overlay.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_SAMPLES: usize = 120;
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Snapshot of recent frame timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
}

/// Rolling frame-time tracker.
///
/// Call [`begin_frame`](FrameStats::begin_frame) and
/// [`end_frame`](FrameStats::end_frame) around each frame; `end_frame`
/// returns a metrics snapshot once per report interval so the caller can log
/// it.
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    frame_start: Option<Instant>,
    last_report: Instant,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(MAX_SAMPLES),
            frame_start: None,
            last_report: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    pub fn end_frame(&mut self) -> Option<FrameMetrics> {
        let start = self.frame_start.take()?;
        self.record(start.elapsed());

        if self.last_report.elapsed() >= REPORT_INTERVAL {
            self.last_report = Instant::now();
            return self.metrics();
        }
        None
    }

    /// Adds one frame-time sample, evicting the oldest past the window.
    pub fn record(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= MAX_SAMPLES {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
    }

    pub fn metrics(&self) -> Option<FrameMetrics> {
        if self.frame_times.is_empty() {
            return None;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_ms = total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;
        let min = self.frame_times.iter().min().copied().unwrap_or_default();
        let max = self.frame_times.iter().max().copied().unwrap_or_default();

        Some(FrameMetrics {
            fps: if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 },
            frame_time_ms: avg_ms,
            min_frame_time_ms: min.as_secs_f32() * 1000.0,
            max_frame_time_ms: max.as_secs_f32() * 1000.0,
        })
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_means_no_metrics() {
        assert!(FrameStats::new().metrics().is_none());
    }

    #[test]
    fn metrics_reflect_recorded_frames() {
        let mut stats = FrameStats::new();
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));

        let metrics = stats.metrics().unwrap();
        assert!((metrics.frame_time_ms - 20.0).abs() < 1e-3);
        assert!((metrics.fps - 50.0).abs() < 1e-2);
        assert!((metrics.min_frame_time_ms - 10.0).abs() < 1e-3);
        assert!((metrics.max_frame_time_ms - 30.0).abs() < 1e-3);
    }

    #[test]
    fn sample_window_is_bounded() {
        let mut stats = FrameStats::new();
        for _ in 0..(MAX_SAMPLES * 2) {
            stats.record(Duration::from_millis(16));
        }
        assert_eq!(stats.frame_times.len(), MAX_SAMPLES);
    }
}
