use glam::Mat4;

/// Size of the display surface in pixels.
///
/// The panel shader works in surface pixels with the origin at the
/// bottom-left; `ortho()` maps that space to clip space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    /// The G1000 display surface size.
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Orthographic pixel projection: (0,0) bottom-left, (width,height) top-right.
    pub fn ortho(self) -> Mat4 {
        Mat4::orthographic_rh_gl(0.0, self.width, 0.0, self.height, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn ortho_maps_corners_to_clip_space() {
        let p = Viewport::new(1024.0, 768.0).ortho();
        let bl = p.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let tr = p.project_point3(Vec3::new(1024.0, 768.0, 0.0));
        assert!((bl.x + 1.0).abs() < 1e-6 && (bl.y + 1.0).abs() < 1e-6);
        assert!((tr.x - 1.0).abs() < 1e-6 && (tr.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_size_is_invalid() {
        assert!(!Viewport::new(0.0, 768.0).is_valid());
        assert!(Viewport::default().is_valid());
    }
}
