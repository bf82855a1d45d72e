/// Which surface orientation classes the session should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneDetection {
    pub horizontal: bool,
    pub vertical: bool,
}

impl PlaneDetection {
    pub const NONE: PlaneDetection = PlaneDetection {
        horizontal: false,
        vertical: false,
    };

    pub const HORIZONTAL: PlaneDetection = PlaneDetection {
        horizontal: true,
        vertical: false,
    };
}

/// Configuration supplied when a tracking session starts.
///
/// The demo enables horizontal plane detection only; vertical surfaces are
/// accepted in the config for completeness but the detector never reports
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldTrackingConfig {
    pub plane_detection: PlaneDetection,
}

impl Default for WorldTrackingConfig {
    fn default() -> Self {
        Self {
            plane_detection: PlaneDetection::HORIZONTAL,
        }
    }
}
