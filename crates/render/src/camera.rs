//! Perspective camera read by the renderer and written by the orbit
//! controller.
//!
//! The projection matrix is cached: after changing `fov_y_degrees`,
//! `aspect`, `near` or `far` call [`Camera::update_projection_matrix`].
//! [`Camera::resize`] does this itself.

use glam::{Mat3, Mat4, Quat, Vec3};
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Orientation; the camera looks down its local -Z.
    pub rotation: Quat,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Camera {
    #[must_use]
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            up: Vec3::Y,
            fov_y_degrees,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Turns the camera so its -Z axis points at `target`, keeping `up` as
    /// close to vertical as possible. No-op when `target` is the position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let right = forward
            .cross(self.up)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far);
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// World-to-camera transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Camera-space x axis in world coordinates.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Camera-space y axis in world coordinates.
    #[must_use]
    pub fn local_up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Matches the aspect ratio to a new viewport. Zero-sized viewports
    /// (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring zero-sized viewport");
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_axis_at_target() {
        let mut camera = Camera::perspective(45.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 20.0, 100.0);
        camera.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(expected, 1e-5));
        assert!(camera.right().y.abs() < 1e-5, "camera should not roll");
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let mut camera = Camera::perspective(45.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.position = Vec3::new(10.0, 5.0, 30.0);
        let target = Vec3::new(0.0, 2.0, 0.0);
        camera.look_at(target);
        let clip = camera.view_projection() * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "ndc={ndc:?}");
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn resize_updates_cached_projection() {
        let mut camera = Camera::perspective(45.0, 1.0, 0.1, 1000.0);
        let before = camera.projection_matrix();
        camera.resize(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_ne!(camera.projection_matrix(), before);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut camera = Camera::perspective(45.0, 1.5, 0.1, 1000.0);
        camera.resize(0, 600);
        camera.resize(800, 0);
        assert!((camera.aspect - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn field_changes_need_explicit_update() {
        let mut camera = Camera::perspective(45.0, 1.0, 0.1, 1000.0);
        let before = camera.projection_matrix();
        camera.fov_y_degrees = 60.0;
        assert_eq!(camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
    }
}
