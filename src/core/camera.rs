//! Cameras that drive visibility and chunk rendering

use crate::core::types::{DVec3, Mat4, Quat, Vec3};
use crate::math::Frustum;

/// Viewpoint consumed by the world renderer.
///
/// Positions are `f64` so chunk translations stay exact far from the origin;
/// matrices are camera-relative (no translation) and `f32`.
pub trait Camera: Send {
    /// World position of the eye
    fn position(&self) -> DVec3;

    fn set_position(&mut self, position: DVec3);

    /// Apply the view transform for the draws that follow. Called once per
    /// pass, before the pass issues any chunk draws.
    fn look_through(&mut self);

    /// Camera-relative frustum, if this camera can cull at all
    fn frustum(&self) -> Option<Frustum>;
}

/// Perspective camera with position, rotation, and projection parameters
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// World position
    pub position: DVec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// View-projection applied by the last `look_through`
    applied_view_projection: Mat4,
}

impl PerspectiveCamera {
    /// Create a new camera
    pub fn new(position: DVec3, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: 2048.0,
            applied_view_projection: Mat4::IDENTITY,
        }
    }

    /// Rotation-only view matrix (world-relative-to-eye to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation.conjugate())
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Camera-relative view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Matrix applied by the most recent `look_through`
    pub fn applied_view_projection(&self) -> Mat4 {
        self.applied_view_projection
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Set rotation from euler angles (yaw, pitch in radians)
    pub fn set_rotation_euler(&mut self, yaw: f32, pitch: f32) {
        self.rotation = Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, 0.0);
    }

    /// Update aspect ratio (call on window resize)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(DVec3::new(0.0, 80.0, 0.0), 70.0, 16.0 / 9.0)
    }
}

impl Camera for PerspectiveCamera {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    fn look_through(&mut self) {
        self.applied_view_projection = self.view_projection();
    }

    fn frustum(&self) -> Option<Frustum> {
        Some(Frustum::from_view_projection(&self.view_projection()))
    }
}

/// Camera used by the headless renderer: it has a position (so proximity
/// still follows the player) but never renders or culls.
#[derive(Clone, Debug, Default)]
pub struct NullCamera {
    pub position: DVec3,
}

impl NullCamera {
    pub fn new(position: DVec3) -> Self {
        Self { position }
    }
}

impl Camera for NullCamera {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    fn look_through(&mut self) {}

    fn frustum(&self) -> Option<Frustum> {
        None
    }
}
