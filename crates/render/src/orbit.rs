//! Orbit camera controller.
//!
//! Pointer drags rotate the camera around [`OrbitController::target`] (primary
//! button), dolly it (middle) or pan camera and target together (secondary);
//! the wheel dollies in fixed steps. Input only accumulates deltas. Nothing
//! moves until [`OrbitController::update`], which must run once per frame and
//! after any manual change to the camera so the orbit state is re-derived
//! from where the camera actually is.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};
use tracing::trace;

use crate::camera::Camera;

const EPS: f32 = 1e-6;
/// Rotation change below this (in `8 * (1 - cos(angle / 2))`) is noise.
const ROTATION_EPS: f32 = 1e-5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Gesture {
    Idle,
    Rotate,
    Dolly,
    Pan,
}

/// Offset from the target as radius, azimuth around +Y (`theta`, from +Z)
/// and polar angle from +Y (`phi`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let ring = self.phi.sin() * self.radius;
        Vec3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }
}

#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update while damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Azimuth limits; both must be finite to take effect.
    pub min_azimuth_angle: f32,
    pub max_azimuth_angle: f32,
    viewport: Vec2,
    gesture: Gesture,
    last_pointer: Vec2,
    delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitController {
    #[must_use]
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_azimuth_angle: f32::NEG_INFINITY,
            max_azimuth_angle: f32::INFINITY,
            viewport: Vec2::ONE,
            gesture: Gesture::Idle,
            last_pointer: Vec2::ZERO,
            delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Drag distances are measured against the viewport height.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = Vec2::new(width as f32, height as f32);
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        self.gesture = match button {
            PointerButton::Primary => Gesture::Rotate,
            PointerButton::Middle => Gesture::Dolly,
            PointerButton::Secondary => Gesture::Pan,
        };
        self.last_pointer = Vec2::new(x, y);
    }

    /// Pan needs the camera's current axes, hence the borrow.
    pub fn pointer_move(&mut self, camera: &Camera, x: f32, y: f32) {
        let pointer = Vec2::new(x, y);
        let moved = pointer - self.last_pointer;
        self.last_pointer = pointer;
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Rotate => {
                let height = self.viewport.y;
                self.rotate_left(TAU * moved.x / height * self.rotate_speed);
                self.rotate_up(TAU * moved.y / height * self.rotate_speed);
            }
            Gesture::Dolly => {
                if moved.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if moved.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            Gesture::Pan => self.pan(moved * self.pan_speed, camera),
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Negative `delta_y` (scrolling up) moves closer.
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if delta_y > 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta.phi -= angle;
    }

    pub fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale /= factor;
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    fn pan(&mut self, moved: Vec2, camera: &Camera) {
        let distance = (camera.position - self.target).length()
            * (camera.fov_y_degrees.to_radians() / 2.0).tan();
        let height = self.viewport.y;
        self.pan_offset -= camera.right() * (2.0 * moved.x * distance / height);
        self.pan_offset += camera.local_up() * (2.0 * moved.y * distance / height);
    }

    /// Applies pending input to `camera` and re-aims it at the target.
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let to_y_up = Quat::from_rotation_arc(camera.up.normalize_or_zero(), Vec3::Y);
        let mut spherical = Spherical::from_offset(to_y_up * (camera.position - self.target));

        let applied = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta.theta * applied;
        spherical.phi += self.delta.phi * applied;

        spherical.theta = self.clamp_azimuth(spherical.theta);
        spherical.phi = spherical
            .phi
            .max(self.min_polar_angle)
            .min(self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale)
            .max(self.min_distance)
            .min(self.max_distance);

        self.target += self.pan_offset * applied;

        let before = (camera.position, camera.rotation);
        camera.position = self.target + to_y_up.inverse() * spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta.theta *= keep;
            self.delta.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = before.0.distance_squared(camera.position) > EPS
            || 8.0 * (1.0 - before.1.dot(camera.rotation).abs()) > ROTATION_EPS;
        if moved {
            trace!(position = ?camera.position, target = ?self.target, "orbit camera moved");
        }
        moved
    }

    fn clamp_azimuth(&self, theta: f32) -> f32 {
        let (mut min, mut max) = (self.min_azimuth_angle, self.max_azimuth_angle);
        if !(min.is_finite() && max.is_finite()) {
            return theta;
        }
        if min < -PI {
            min += TAU;
        } else if min > PI {
            min -= TAU;
        }
        if max < -PI {
            max += TAU;
        } else if max > PI {
            max -= TAU;
        }
        if min <= max {
            theta.max(min).min(max)
        } else if theta > (min + max) / 2.0 {
            theta.max(min)
        } else {
            theta.min(max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spherical_round_trip() {
        let offset = Vec3::new(3.0, 4.0, -5.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!(back.abs_diff_eq(offset, 1e-4));
    }

    #[test]
    fn azimuth_limits_apply_only_when_finite() {
        let mut controls = OrbitController::new(Vec3::ZERO);
        assert!((controls.clamp_azimuth(3.0) - 3.0).abs() < f32::EPSILON);
        controls.min_azimuth_angle = -0.5;
        controls.max_azimuth_angle = 0.5;
        assert!((controls.clamp_azimuth(3.0) - 0.5).abs() < f32::EPSILON);
        assert!((controls.clamp_azimuth(-3.0) + 0.5).abs() < f32::EPSILON);
    }
}
