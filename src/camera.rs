//! Orbit camera
//!
//! Looks at a target point from a fixed pitch. Middle-drag rotates around the
//! vertical axis, the wheel zooms between [`MIN_ZOOM`] and [`MAX_ZOOM`], and
//! the pan input slides the target across the ground plane.

use glam::{Mat4, Vec2, Vec3};

use crate::backend::CameraUniform;

pub const DEFAULT_ZOOM: f32 = 10.0;
pub const MIN_ZOOM: f32 = 5.0;
pub const MAX_ZOOM: f32 = 15.0;
/// Zoom distance per wheel notch
pub const ZOOM_SENSITIVITY: f32 = 2.0;
/// Radians of yaw per pixel of horizontal drag
pub const ORBIT_SENSITIVITY: f32 = 0.005;
/// Target movement per frame of pan input
pub const PAN_SPEED: f32 = 0.15;

/// Input gathered by the window layer since the previous frame
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    /// Mouse delta in pixels
    pub mouse_delta: Vec2,
    /// Wheel notches, positive away from the user
    pub scroll_delta: f32,
    /// Middle button held
    pub orbit_active: bool,
    /// Pan direction: x to the right, y forward, each in [-1, 1]
    pub pan: Vec2,
}

impl CameraInput {
    /// Reset per-frame deltas (call after update)
    pub fn reset_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Rotation around +Y in radians
    pub yaw: f32,
    /// Downward tilt in radians
    pub pitch: f32,
    zoom: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: std::f32::consts::FRAC_PI_4,
            zoom: DEFAULT_ZOOM,
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl OrbitCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self::default();
        camera.set_viewport(width, height);
        camera
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Apply wheel notches; the distance stays within the zoom limits
    pub fn apply_zoom(&mut self, notches: f32) {
        self.zoom = (self.zoom - notches * ZOOM_SENSITIVITY).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn update(&mut self, input: &CameraInput) {
        if input.scroll_delta != 0.0 {
            self.apply_zoom(input.scroll_delta);
        }

        if input.orbit_active {
            self.yaw += input.mouse_delta.x * ORBIT_SENSITIVITY;
        } else if input.pan != Vec2::ZERO {
            let forward = self.forward();
            let flat_forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
            let flat_right = flat_forward.cross(Vec3::Y);
            self.target += (flat_right * input.pan.x + flat_forward * input.pan.y) * PAN_SPEED;
        }
    }

    /// Unit vector from the eye towards the target
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cp * sy, -sp, -cp * cy)
    }

    pub fn eye(&self) -> Vec3 {
        self.target - self.forward() * self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        let view = self.view_matrix();
        let proj = self.projection_matrix();
        CameraUniform {
            view,
            proj,
            view_proj: proj * view,
            eye: self.eye().extend(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, 8.0)]
    #[case(-1.0, 12.0)]
    #[case(10.0, MIN_ZOOM)]
    #[case(-10.0, MAX_ZOOM)]
    fn zoom_is_clamped(#[case] notches: f32, #[case] expected: f32) {
        let mut camera = OrbitCamera::default();
        camera.apply_zoom(notches);
        assert_eq!(camera.zoom(), expected);
    }

    #[test]
    fn eye_sits_at_zoom_distance() {
        let camera = OrbitCamera::default();
        assert!((camera.eye().distance(camera.target) - DEFAULT_ZOOM).abs() < 1e-4);
        assert!(camera.eye().y > 0.0);
    }

    #[test]
    fn orbit_keeps_height() {
        let mut camera = OrbitCamera::default();
        let before = camera.eye();
        camera.update(&CameraInput {
            mouse_delta: Vec2::new(200.0, 0.0),
            orbit_active: true,
            ..Default::default()
        });
        let after = camera.eye();
        assert!((before.y - after.y).abs() < 1e-4);
        assert!(before.distance(after) > 0.1);
    }

    #[test]
    fn pan_moves_target_on_ground_plane() {
        let mut camera = OrbitCamera::default();
        camera.update(&CameraInput {
            pan: Vec2::new(0.0, 1.0),
            ..Default::default()
        });
        assert_eq!(camera.target.y, 0.0);
        assert!((camera.target.length() - PAN_SPEED).abs() < 1e-5);
    }
}
