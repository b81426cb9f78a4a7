//! Plain data types shared by bodies, constraints and the scene.

use std::fmt;

pub use glam::{Mat4, Quat, Vec3};

use crate::error::SceneError;

/// Identifier of a body registered with a [`crate::Scene`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u32);

/// Identifier of a constraint registered with a [`crate::Scene`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub(crate) u32);

impl BodyId {
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl ConstraintId {
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint#{}", self.0)
    }
}

/// Rigid transform: translation followed by rotation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// `self ∘ local`: places a transform expressed in this frame into the
    /// frame this transform lives in.
    #[must_use]
    pub fn mul_transform(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    #[must_use]
    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            position: rotation * -self.position,
            rotation,
        }
    }

    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Surface response of a body plus the tint it is drawn with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
    /// Packed `0xRRGGBB`.
    pub color: u32,
}

impl Material {
    #[must_use]
    pub const fn new(color: u32, friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
            color,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(SceneError::InvalidMaterial(format!(
                "friction {} must be finite and non-negative",
                self.friction
            )));
        }
        if !self.restitution.is_finite() || self.restitution < 0.0 {
            return Err(SceneError::InvalidMaterial(format!(
                "restitution {} must be finite and non-negative",
                self.restitution
            )));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(0xff_ff_ff, 0.8, 0.2)
    }
}

/// Collision and render geometry. Cylinders are aligned with the local Y axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        /// Only affects how smooth the rendered mesh is.
        radial_segments: u32,
    },
}

impl Shape {
    /// Volume of the axis-aligned bounding box, used as the default mass.
    #[must_use]
    pub fn bounding_volume(&self) -> f32 {
        let size = self.bounding_size();
        size.x * size.y * size.z
    }

    #[must_use]
    pub fn bounding_size(&self) -> Vec3 {
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                ..
            } => {
                let diameter = 2.0 * radius_top.max(radius_bottom);
                Vec3::new(diameter, height, diameter)
            }
        }
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Cylinder { .. } => "cylinder",
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SceneError::InvalidShape(format!(
                    "{} {name} = {value} must be finite and positive",
                    self.kind_name()
                )))
            }
        };
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => {
                positive("width", width)?;
                positive("height", height)?;
                positive("depth", depth)
            }
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => {
                positive("height", height)?;
                if !(radius_top.is_finite() && radius_bottom.is_finite())
                    || radius_top < 0.0
                    || radius_bottom < 0.0
                    || radius_top.max(radius_bottom) <= 0.0
                {
                    return Err(SceneError::InvalidShape(format!(
                        "cylinder radii ({radius_top}, {radius_bottom}) must be non-negative with one positive"
                    )));
                }
                if radial_segments < 3 {
                    return Err(SceneError::InvalidShape(format!(
                        "cylinder needs at least 3 radial segments, got {radial_segments}"
                    )));
                }
                Ok(())
            }
        }
    }
}
