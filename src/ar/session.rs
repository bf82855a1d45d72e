use std::collections::HashMap;

use cgmath::Vector3;

use super::anchor::{AnchorEvent, AnchorId, PlaneAnchor};
use super::config::WorldTrackingConfig;
use super::detector::{PlaneDetector, SurfaceSpec};

const DEFAULT_SEED: u64 = 0x5eed;

/// Two-state session lifecycle, toggled by the hosting view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Paused,
    Running,
}

/// The tracking process that discovers surfaces and reports anchors over
/// time.
///
/// Owns the plane estimator and the table of anchors reported so far. The
/// session starts paused; [`run`](TrackingSession::run) starts or resumes it
/// with a configuration and [`pause`](TrackingSession::pause) suspends it.
/// Pausing keeps all anchors; resuming continues from where tracking left
/// off.
pub struct TrackingSession {
    state: SessionState,
    config: WorldTrackingConfig,
    detector: PlaneDetector,
    anchors: HashMap<AnchorId, PlaneAnchor>,
}

impl TrackingSession {
    pub fn new(environment: Vec<SurfaceSpec>) -> Self {
        Self::with_seed(environment, DEFAULT_SEED)
    }

    pub fn with_seed(environment: Vec<SurfaceSpec>, seed: u64) -> Self {
        Self {
            state: SessionState::Paused,
            config: WorldTrackingConfig::default(),
            detector: PlaneDetector::new(environment, seed),
            anchors: HashMap::new(),
        }
    }

    /// Starts or resumes tracking with the given configuration.
    ///
    /// Running an already-running session just swaps the configuration;
    /// anchors reported so far are kept either way.
    pub fn run(&mut self, config: WorldTrackingConfig) {
        log::info!("tracking session running: {:?}", config.plane_detection);
        self.config = config;
        self.state = SessionState::Running;
    }

    /// Suspends tracking. No events are produced until [`run`] is called
    /// again.
    ///
    /// [`run`]: TrackingSession::run
    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            log::info!("tracking session paused");
        }
        self.state = SessionState::Paused;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Advances tracking by `dt` seconds and returns the anchor notifications
    /// produced, in order. Returns nothing while paused.
    pub fn step(&mut self, dt: f32) -> Vec<AnchorEvent> {
        if self.state != SessionState::Running {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.detector
            .step(dt, self.config.plane_detection, &mut events);

        for event in &events {
            let anchor = event.anchor();
            self.anchors.insert(anchor.id, anchor.clone());
        }
        events
    }

    /// The latest revision of every anchor reported so far.
    pub fn anchors(&self) -> impl Iterator<Item = &PlaneAnchor> {
        self.anchors.values()
    }

    /// The accumulated synthetic point cloud, for debug display.
    pub fn feature_points(&self) -> &[Vector3<f32>] {
        self.detector.feature_points()
    }

    /// The default demo environment: a floor slab with a table top above it.
    pub fn default_environment() -> Vec<SurfaceSpec> {
        vec![
            SurfaceSpec::new(Vector3::new(0.0, -1.2, -1.0), 3.2, 2.4),
            SurfaceSpec::new(Vector3::new(0.8, -0.45, -1.2), 1.2, 0.7),
        ]
    }
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(Self::default_environment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::PlaneDetection;

    fn one_surface() -> Vec<SurfaceSpec> {
        vec![SurfaceSpec::new(Vector3::new(0.0, 0.0, 0.0), 2.0, 2.0)]
    }

    #[test]
    fn session_starts_paused() {
        let session = TrackingSession::new(one_surface());
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn step_while_paused_is_a_no_op() {
        let mut session = TrackingSession::new(one_surface());
        for _ in 0..50 {
            assert!(session.step(0.1).is_empty());
        }
        assert_eq!(session.anchors().count(), 0);
        assert!(session.feature_points().is_empty());
    }

    #[test]
    fn running_session_reports_each_surface_once() {
        let mut session = TrackingSession::new(one_surface());
        session.run(WorldTrackingConfig::default());

        let mut added = 0;
        for _ in 0..100 {
            for event in session.step(0.1) {
                if matches!(event, AnchorEvent::Added(_)) {
                    added += 1;
                }
            }
        }
        assert_eq!(added, 1);
        assert_eq!(session.anchors().count(), 1);
    }

    #[test]
    fn anchor_table_holds_the_latest_revision() {
        let mut session = TrackingSession::new(one_surface());
        session.run(WorldTrackingConfig::default());

        let mut last_seen = None;
        for _ in 0..100 {
            if let Some(event) = session.step(0.1).into_iter().last() {
                last_seen = Some(event.anchor().clone());
            }
        }

        let last_seen = last_seen.expect("no events produced");
        let stored = session.anchors().next().expect("no anchor stored");
        assert_eq!(*stored, last_seen);
    }

    #[test]
    fn rerunning_swaps_the_config_and_keeps_anchors() {
        let mut session = TrackingSession::new(one_surface());
        session.run(WorldTrackingConfig::default());
        for _ in 0..20 {
            session.step(0.1);
        }
        let anchors_before = session.anchors().count();
        assert!(anchors_before > 0);

        // Re-running while already running just replaces the config.
        session.run(WorldTrackingConfig {
            plane_detection: PlaneDetection::NONE,
        });
        assert!(session.is_running());
        let mut while_disabled = 0;
        for _ in 0..20 {
            while_disabled += session.step(0.1).len();
        }
        assert_eq!(while_disabled, 0);
        assert_eq!(session.anchors().count(), anchors_before);

        // Re-enabling detection picks the same anchors back up.
        session.run(WorldTrackingConfig::default());
        let mut resumed = 0;
        for _ in 0..30 {
            resumed += session.step(0.1).len();
        }
        assert!(resumed > 0);
        assert_eq!(session.anchors().count(), anchors_before);
    }

    #[test]
    fn pause_suspends_and_resume_continues() {
        let mut session = TrackingSession::new(one_surface());
        session.run(WorldTrackingConfig::default());
        session.step(1.0);

        session.pause();
        let anchors_before = session.anchors().count();
        assert!(session.step(10.0).is_empty());
        assert_eq!(session.anchors().count(), anchors_before);

        session.run(WorldTrackingConfig::default());
        // Tracking picks up again rather than starting over.
        let mut produced = 0;
        for _ in 0..100 {
            produced += session.step(0.1).len();
        }
        assert!(produced > 0);
    }
}
