pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;
pub const DEFAULT_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    projection: [[f32; 4]; 4],
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: [0.0, 0.0, DEFAULT_DISTANCE],
            projection: [[0.0; 4]; 4],
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn with_aspect(aspect: f32) -> Self {
        Self::new(DEFAULT_FOV_DEGREES, aspect, DEFAULT_NEAR, DEFAULT_FAR)
    }

    /// Must be called after changing any lens parameter.
    pub fn update_projection_matrix(&mut self) {
        let f = 1.0 / (self.fov_degrees.to_radians() / 2.0).tan();
        let range = self.near - self.far;

        // Column-major, right-handed, clip space z in [-1, 1].
        self.projection = [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (self.far + self.near) / range, -1.0],
            [0.0, 0.0, 2.0 * self.far * self.near / range, 0.0],
        ];
    }

    pub fn projection_matrix(&self) -> &[[f32; 4]; 4] {
        &self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let camera = PerspectiveCamera::with_aspect(2.0);
        assert_eq!(camera.fov_degrees, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, [0.0, 0.0, 5.0]);
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut camera = PerspectiveCamera::with_aspect(1.0);
        let square = camera.projection_matrix()[0][0];
        assert!((square - camera.projection_matrix()[1][1]).abs() < 1e-6);

        camera.aspect = 2.0;
        camera.update_projection_matrix();
        assert!((camera.projection_matrix()[0][0] - square / 2.0).abs() < 1e-6);
        assert_eq!(camera.projection_matrix()[2][3], -1.0);
    }
}
