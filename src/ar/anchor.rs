use cgmath::Vector3;

/// Identifies one tracked surface for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Horizontal extent of a detected surface in meters.
///
/// `width` runs along the world X axis, `depth` along Z. Detected surfaces
/// are horizontal, so there is no vertical component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub depth: f32,
}

impl Extent {
    pub const ZERO: Extent = Extent {
        width: 0.0,
        depth: 0.0,
    };

    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }
}

/// A detected flat surface as reported by the tracker.
///
/// `position` is the world-space anchor origin, fixed at the point where the
/// surface was first picked up. The current best estimate of the surface is
/// a rectangle of `extent` whose midpoint sits at `center`, an offset in
/// anchor-local coordinates. Both `center` and `extent` are revised as the
/// tracker observes more of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneAnchor {
    pub id: AnchorId,
    pub position: Vector3<f32>,
    pub center: Vector3<f32>,
    pub extent: Extent,
}

/// Notification emitted by the session as surfaces are discovered or revised.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorEvent {
    /// A surface was seen for the first time.
    Added(PlaneAnchor),
    /// An already-reported surface's geometry estimate changed.
    Updated(PlaneAnchor),
}

impl AnchorEvent {
    pub fn anchor(&self) -> &PlaneAnchor {
        match self {
            AnchorEvent::Added(anchor) | AnchorEvent::Updated(anchor) => anchor,
        }
    }
}
