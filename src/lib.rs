// src/lib.rs
//! Planar
//!
//! A minimal AR-style plane-detection demo built on wgpu and winit. A
//! synthetic tracking session discovers horizontal surfaces over time and a
//! scene delegate overlays each one with a translucent rectangle and a small
//! ship model.

pub mod app;
pub mod ar;
pub mod gfx;
pub mod overlay;
pub mod scene;
pub mod stats;

// Re-export main types for convenience
pub use app::PlanarApp;
pub use ar::{PlaneAnchor, TrackingSession, WorldTrackingConfig};
pub use overlay::PlaneOverlay;
pub use scene::{ModelAsset, Node, Scene, SceneDelegate};

/// Creates a default Planar application instance
pub fn default() -> PlanarApp {
    PlanarApp::new()
}
