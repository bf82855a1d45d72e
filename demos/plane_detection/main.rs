//! Plane detection demo.
//!
//! Opens a window, starts a tracking session over the built-in demo room,
//! and overlays every detected surface with a translucent blue plane and a
//! small ship model. Drag with the left mouse button to orbit, scroll to
//! zoom, Escape to quit.

use anyhow::Result;
use planar::{ModelAsset, PlaneOverlay};

fn main() -> Result<()> {
    env_logger::init();

    let mut app = planar::default();

    let ship = ModelAsset::load("assets/ship.obj")?;
    app.set_delegate(PlaneOverlay::new(ship));

    app.run();
    Ok(())
}
