use cgmath::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::anchor::{AnchorEvent, AnchorId, Extent, PlaneAnchor};
use super::config::PlaneDetection;

/// Fraction of a surface that must be observed before it is reported at all.
const MIN_COVERAGE: f32 = 0.15;

/// Additional coverage required before an already-reported anchor is revised.
const REPORT_STEP: f32 = 0.04;

/// Coverage gained per second of tracking.
const COVERAGE_RATE: f32 = 0.22;

/// Feature points sampled per second per surface.
const POINT_RATE: f32 = 90.0;

/// Upper bound on the retained point cloud.
const MAX_FEATURE_POINTS: usize = 2048;

/// A horizontal surface in the synthetic environment.
///
/// `origin` is the world-space midpoint of the surface rectangle; `width`
/// runs along X and `depth` along Z.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSpec {
    pub origin: Vector3<f32>,
    pub width: f32,
    pub depth: f32,
}

impl SurfaceSpec {
    pub fn new(origin: Vector3<f32>, width: f32, depth: f32) -> Self {
        Self {
            origin,
            width,
            depth,
        }
    }

    fn min_x(&self) -> f32 {
        self.origin.x - self.width * 0.5
    }

    fn max_x(&self) -> f32 {
        self.origin.x + self.width * 0.5
    }

    fn min_z(&self) -> f32 {
        self.origin.z - self.depth * 0.5
    }

    fn max_z(&self) -> f32 {
        self.origin.z + self.depth * 0.5
    }
}

/// Per-surface estimation state.
struct SurfaceTracker {
    spec: SurfaceSpec,
    /// Where the surface was first observed. Becomes the anchor origin.
    seed: Vector3<f32>,
    /// Observed fraction of the surface, 0..=1.
    coverage: f32,
    /// Coverage at the time of the last emitted report.
    reported_at: f32,
    anchor_id: Option<AnchorId>,
}

impl SurfaceTracker {
    fn new(spec: SurfaceSpec, rng: &mut StdRng) -> Self {
        // First sighting lands somewhere in the interior, not at the midpoint,
        // so the estimated rectangle visibly grows and re-centers over time.
        let seed = Vector3::new(
            spec.origin.x + rng.random_range(-0.3..0.3) * spec.width,
            spec.origin.y,
            spec.origin.z + rng.random_range(-0.3..0.3) * spec.depth,
        );
        Self {
            spec,
            seed,
            coverage: 0.0,
            reported_at: 0.0,
            anchor_id: None,
        }
    }

    /// The currently observed sub-rectangle: a square reach around the seed
    /// point, clipped to the true surface bounds.
    fn observed_bounds(&self) -> (f32, f32, f32, f32) {
        let reach = self.coverage * self.spec.width.max(self.spec.depth);
        let min_x = (self.seed.x - reach).max(self.spec.min_x());
        let max_x = (self.seed.x + reach).min(self.spec.max_x());
        let min_z = (self.seed.z - reach).max(self.spec.min_z());
        let max_z = (self.seed.z + reach).min(self.spec.max_z());
        (min_x, max_x, min_z, max_z)
    }

    fn estimate(&self, id: AnchorId) -> PlaneAnchor {
        let (min_x, max_x, min_z, max_z) = self.observed_bounds();
        let center_world = Vector3::new(
            (min_x + max_x) * 0.5,
            self.spec.origin.y,
            (min_z + max_z) * 0.5,
        );
        PlaneAnchor {
            id,
            position: self.seed,
            center: center_world - self.seed,
            extent: Extent::new(max_x - min_x, max_z - min_z),
        }
    }
}

/// Synthetic plane estimator.
///
/// Walks a list of [`SurfaceSpec`]s instead of a camera feed. Each step it
/// samples feature points on the part of every surface observed so far and
/// reports anchors in the shape a real tracker would: one `Added` when enough
/// of a surface has been seen, then `Updated` revisions with a growing extent
/// and a shifting center until the whole surface is covered.
///
/// Fully deterministic for a fixed environment and seed.
pub struct PlaneDetector {
    rng: StdRng,
    trackers: Vec<SurfaceTracker>,
    feature_points: Vec<Vector3<f32>>,
    next_anchor_id: u64,
}

impl PlaneDetector {
    pub fn new(environment: Vec<SurfaceSpec>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let trackers = environment
            .into_iter()
            .map(|spec| SurfaceTracker::new(spec, &mut rng))
            .collect();
        Self {
            rng,
            trackers,
            feature_points: Vec::new(),
            next_anchor_id: 0,
        }
    }

    /// Advances estimation by `dt` seconds, appending any anchor reports.
    pub fn step(&mut self, dt: f32, detection: PlaneDetection, events: &mut Vec<AnchorEvent>) {
        for tracker in &mut self.trackers {
            tracker.coverage = (tracker.coverage + dt * COVERAGE_RATE).min(1.0);

            // Feature points accumulate whether or not plane detection is
            // enabled; the point cloud is a tracking byproduct.
            let count = ((dt * POINT_RATE) as usize).max(1);
            let (min_x, max_x, min_z, max_z) = tracker.observed_bounds();
            for _ in 0..count {
                let point = Vector3::new(
                    self.rng.random_range(min_x..=max_x),
                    tracker.spec.origin.y + self.rng.random_range(-0.004..0.004),
                    self.rng.random_range(min_z..=max_z),
                );
                self.feature_points.push(point);
            }

            if !detection.horizontal || tracker.coverage < MIN_COVERAGE {
                continue;
            }

            match tracker.anchor_id {
                None => {
                    let id = AnchorId(self.next_anchor_id);
                    self.next_anchor_id += 1;
                    tracker.anchor_id = Some(id);
                    tracker.reported_at = tracker.coverage;
                    let anchor = tracker.estimate(id);
                    log::info!(
                        "plane anchor {:?} added at ({:.2}, {:.2}, {:.2})",
                        id,
                        anchor.position.x,
                        anchor.position.y,
                        anchor.position.z
                    );
                    events.push(AnchorEvent::Added(anchor));
                }
                Some(id) if tracker.coverage - tracker.reported_at >= REPORT_STEP => {
                    tracker.reported_at = tracker.coverage;
                    let anchor = tracker.estimate(id);
                    log::debug!(
                        "plane anchor {:?} updated, extent {:.2} x {:.2}",
                        id,
                        anchor.extent.width,
                        anchor.extent.depth
                    );
                    events.push(AnchorEvent::Updated(anchor));
                }
                Some(_) => {}
            }
        }

        if self.feature_points.len() > MAX_FEATURE_POINTS {
            let excess = self.feature_points.len() - MAX_FEATURE_POINTS;
            self.feature_points.drain(..excess);
        }
    }

    pub fn feature_points(&self) -> &[Vector3<f32>] {
        &self.feature_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<SurfaceSpec> {
        vec![SurfaceSpec::new(Vector3::new(0.5, -0.4, -1.0), 1.2, 0.8)]
    }

    fn run_steps(detector: &mut PlaneDetector, steps: usize, dt: f32) -> Vec<AnchorEvent> {
        let mut events = Vec::new();
        for _ in 0..steps {
            detector.step(dt, PlaneDetection::HORIZONTAL, &mut events);
        }
        events
    }

    #[test]
    fn surface_is_added_exactly_once() {
        let mut detector = PlaneDetector::new(table(), 7);
        let events = run_steps(&mut detector, 100, 0.1);

        let added = events
            .iter()
            .filter(|e| matches!(e, AnchorEvent::Added(_)))
            .count();
        assert_eq!(added, 1);
        assert!(events.len() > 1, "expected revisions after the add");
    }

    #[test]
    fn updates_only_follow_an_add() {
        let mut detector = PlaneDetector::new(table(), 7);
        let events = run_steps(&mut detector, 100, 0.1);

        let first_for_id = events.iter().find(|e| e.anchor().id == AnchorId(0));
        assert!(matches!(first_for_id, Some(AnchorEvent::Added(_))));
    }

    #[test]
    fn extent_grows_monotonically_and_stays_in_bounds() {
        let mut detector = PlaneDetector::new(table(), 42);
        let events = run_steps(&mut detector, 200, 0.1);

        let mut prev = Extent::ZERO;
        for event in &events {
            let extent = event.anchor().extent;
            assert!(extent.width >= prev.width && extent.depth >= prev.depth);
            assert!(extent.width <= 1.2 + 1e-4);
            assert!(extent.depth <= 0.8 + 1e-4);
            prev = extent;
        }
        // Enough steps to converge on the full surface.
        assert!((prev.width - 1.2).abs() < 1e-4);
        assert!((prev.depth - 0.8).abs() < 1e-4);
    }

    #[test]
    fn estimated_rect_covers_the_true_surface_once_converged() {
        let mut detector = PlaneDetector::new(table(), 42);
        let events = run_steps(&mut detector, 200, 0.1);

        let last = events.last().unwrap().anchor();
        let center = last.position + last.center;
        assert!((center.x - 0.5).abs() < 1e-4);
        assert!((center.z - -1.0).abs() < 1e-4);
    }

    #[test]
    fn detection_disabled_reports_nothing() {
        let mut detector = PlaneDetector::new(table(), 7);
        let mut events = Vec::new();
        for _ in 0..100 {
            detector.step(0.1, PlaneDetection::NONE, &mut events);
        }
        assert!(events.is_empty());
        // The point cloud still accumulates.
        assert!(!detector.feature_points().is_empty());
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let mut a = PlaneDetector::new(table(), 99);
        let mut b = PlaneDetector::new(table(), 99);
        let ea = run_steps(&mut a, 50, 0.1);
        let eb = run_steps(&mut b, 50, 0.1);
        assert_eq!(ea, eb);
    }

    #[test]
    fn point_cloud_is_capped() {
        let mut detector = PlaneDetector::new(table(), 7);
        run_steps(&mut detector, 1000, 0.1);
        assert!(detector.feature_points().len() <= MAX_FEATURE_POINTS);
    }

    #[test]
    fn empty_environment_produces_no_anchors() {
        let mut detector = PlaneDetector::new(Vec::new(), 7);
        let events = run_steps(&mut detector, 50, 0.1);
        assert!(events.is_empty());
        assert!(detector.feature_points().is_empty());
    }
}
