//! # Graphics Module
//!
//! Rendering stand-in for the host framework: a forward wgpu renderer for
//! the node tree, an orbit camera for inspecting the virtual scene, and the
//! debug overlay (feature points, world origin axes).

pub mod camera;
pub mod debug;
pub mod render_engine;
pub mod uniforms;
pub mod vertex;

// Re-export commonly used types
pub use camera::{CameraController, CameraUniform, OrbitCamera};
pub use debug::DebugOptions;
pub use render_engine::RenderEngine;
