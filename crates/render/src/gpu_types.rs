//! GPU buffer layouts.
//!
//! Everything here is `Pod` so a frame can be copied into vertex and
//! uniform buffers with `bytemuck::cast_slice` and no per-field packing.

use bytemuck::{Pod, Zeroable};
use physics::{BodySnapshot, Shape};

use crate::camera::Camera;
use crate::renderer::PointLight;

pub const SHAPE_BOX: u32 = 0;
pub const SHAPE_CYLINDER: u32 = 1;

/// Camera matrices for the vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// World-space eye position, `w = 1`.
    pub eye: [f32; 4],
}

impl From<&Camera> for CameraUniform {
    fn from(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            eye: camera.position.extend(1.0).to_array(),
        }
    }
}

/// The key light of a frame for the fragment stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// World position; `w` is the range, 0 for unlimited.
    pub position: [f32; 4],
    /// Color scaled by intensity.
    pub color: [f32; 4],
}

impl LightUniform {
    /// The first light of the frame. A frame without lights gets a black
    /// light, leaving only ambient shading.
    #[must_use]
    pub fn from_lights(lights: &[PointLight]) -> Self {
        lights.first().map_or_else(Self::zeroed, |light| {
            let [r, g, b, _] = light.rgba();
            let i = light.intensity;
            Self {
                position: light.position.extend(light.distance).to_array(),
                color: [r * i, g * i, b * i, 1.0],
            }
        })
    }
}

/// Per-instance data for one body.
///
/// `dimensions` is `[width, height, depth, 0]` for boxes and
/// `[radius_top, radius_bottom, height, 0]` for cylinders.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub dimensions: [f32; 4],
    pub shape: u32,
    pub radial_segments: u32,
    pub _pad: [u32; 2],
}

impl From<&BodySnapshot> for InstanceRaw {
    fn from(body: &BodySnapshot) -> Self {
        let (shape, dimensions, radial_segments) = match body.shape {
            Shape::Box {
                width,
                height,
                depth,
            } => (SHAPE_BOX, [width, height, depth, 0.0], 0),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => (
                SHAPE_CYLINDER,
                [radius_top, radius_bottom, height, 0.0],
                radial_segments,
            ),
        };
        Self {
            model: body.transform.to_matrix().to_cols_array_2d(),
            color: hex_rgba(body.material.color),
            dimensions,
            shape,
            radial_segments,
            _pad: [0; 2],
        }
    }
}

/// `0xRRGGBB` to `[r, g, b, 1]`.
#[must_use]
pub fn hex_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_have_no_implicit_padding() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 112);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
    }

    #[test]
    fn key_light_is_the_first_one_scaled_by_intensity() {
        let lights = [
            PointLight {
                color: 0xff_00_00,
                intensity: 0.5,
                distance: 100.0,
                position: glam::Vec3::new(1.0, 2.0, 3.0),
            },
            PointLight {
                color: 0xff_ff_ff,
                intensity: 1.0,
                distance: 0.0,
                position: glam::Vec3::ZERO,
            },
        ];
        let key = LightUniform::from_lights(&lights);
        assert_eq!(key.position, [1.0, 2.0, 3.0, 100.0]);
        assert_eq!(key.color, [0.5, 0.0, 0.0, 1.0]);
        assert_eq!(LightUniform::from_lights(&[]).color, [0.0; 4]);
    }

    #[test]
    fn instance_takes_the_material_tint() {
        let body = BodySnapshot {
            id: physics::Scene::new()
                .add(physics::RigidBody::cuboid(1.0, 1.0, 1.0, physics::Material::default()))
                .unwrap(),
            parent: None,
            shape: Shape::Box {
                width: 1.0,
                height: 2.0,
                depth: 3.0,
            },
            material: physics::Material::new(0xff_ff_00, 0.9, 0.3),
            transform: physics::Transform::IDENTITY,
            is_static: true,
        };
        let instance = InstanceRaw::from(&body);
        assert_eq!(instance.color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(instance.shape, SHAPE_BOX);
        assert_eq!(instance.dimensions, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn hex_colors_unpack_per_channel() {
        assert_eq!(hex_rgba(0xffff00), [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(hex_rgba(0x000000), [0.0, 0.0, 0.0, 1.0]);
        let grey = hex_rgba(0xe5e5e5);
        assert!((grey[0] - 229.0 / 255.0).abs() < 1e-6);
    }
}
