//! Debug overlay geometry: the tracked feature-point cloud and the world
//! origin axes.

use cgmath::Vector3;

use super::vertex::DebugVertex;

/// Length of each world-origin axis line in meters.
pub const AXIS_LENGTH: f32 = 0.15;

const FEATURE_POINT_COLOR: [f32; 4] = [1.0, 0.85, 0.3, 1.0];

/// Which debug overlays to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugOptions {
    pub show_feature_points: bool,
    pub show_world_origin: bool,
}

impl DebugOptions {
    pub const ALL: DebugOptions = DebugOptions {
        show_feature_points: true,
        show_world_origin: true,
    };
}

/// Line-list vertices for the world origin: X red, Y green, Z blue.
pub fn origin_axes() -> Vec<DebugVertex> {
    let origin = [0.0, 0.0, 0.0];
    let axes = [
        ([AXIS_LENGTH, 0.0, 0.0], [1.0, 0.2, 0.2, 1.0]),
        ([0.0, AXIS_LENGTH, 0.0], [0.2, 1.0, 0.2, 1.0]),
        ([0.0, 0.0, AXIS_LENGTH], [0.2, 0.4, 1.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(6);
    for (tip, color) in axes {
        vertices.push(DebugVertex {
            position: origin,
            color,
        });
        vertices.push(DebugVertex {
            position: tip,
            color,
        });
    }
    vertices
}

/// Point-list vertices for the tracked feature points.
pub fn point_cloud(points: &[Vector3<f32>]) -> Vec<DebugVertex> {
    points
        .iter()
        .map(|p| DebugVertex {
            position: [p.x, p.y, p.z],
            color: FEATURE_POINT_COLOR,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_axes_are_three_lines_from_the_origin() {
        let vertices = origin_axes();
        assert_eq!(vertices.len(), 6);
        for line in vertices.chunks(2) {
            assert_eq!(line[0].position, [0.0, 0.0, 0.0]);
            assert_eq!(line[0].color, line[1].color);
        }
        assert_eq!(vertices[1].position, [AXIS_LENGTH, 0.0, 0.0]);
        assert_eq!(vertices[3].position, [0.0, AXIS_LENGTH, 0.0]);
        assert_eq!(vertices[5].position, [0.0, 0.0, AXIS_LENGTH]);
    }

    #[test]
    fn point_cloud_preserves_positions() {
        let points = vec![Vector3::new(1.0, 2.0, 3.0)];
        let vertices = point_cloud(&points);
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
    }
}
