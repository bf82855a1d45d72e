//! # Tracking Module
//!
//! This module is the stand-in for the tracking side of an AR framework:
//! a session with a run/paused lifecycle, a plane estimator that discovers
//! horizontal surfaces over time, and the anchor records it reports.
//!
//! The estimator is synthetic. It walks a described environment instead of a
//! camera feed, but it reports anchors the way a real tracker does: a surface
//! appears once with a partial extent, then gets revised repeatedly as more
//! of it is observed (extent grows, center shifts).

pub mod anchor;
pub mod config;
pub mod detector;
pub mod session;

// Re-export main types
pub use anchor::{AnchorEvent, AnchorId, Extent, PlaneAnchor};
pub use config::{PlaneDetection, WorldTrackingConfig};
pub use detector::{PlaneDetector, SurfaceSpec};
pub use session::{SessionState, TrackingSession};
