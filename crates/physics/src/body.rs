//! # Rigid Body Descriptors
//!
//! A [`RigidBody`] binds a shape, a material and a mass into one
//! physics-participating object before it is handed to
//! [`crate::Scene::add`]. Children attached with [`RigidBody::attach`] form a
//! compound: they move with the parent and add collision geometry, but the
//! compound's mass is the parent's mass.

use crate::error::SceneError;
use crate::types::{Material, Quat, Shape, Transform, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    pub shape: Shape,
    pub material: Material,
    mass: Option<f32>,
    /// World transform for a root body, parent-local for an attached child.
    pub transform: Transform,
    pub(crate) children: Vec<RigidBody>,
}

impl RigidBody {
    #[must_use]
    pub fn new(shape: Shape, material: Material) -> Self {
        Self {
            shape,
            material,
            mass: None,
            transform: Transform::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Box with full extents `width × height × depth`.
    #[must_use]
    pub fn cuboid(width: f32, height: f32, depth: f32, material: Material) -> Self {
        Self::new(
            Shape::Box {
                width,
                height,
                depth,
            },
            material,
        )
    }

    #[must_use]
    pub fn cylinder(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        material: Material,
    ) -> Self {
        Self::new(
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            },
            material,
        )
    }

    /// Explicit mass. Zero makes the body static.
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Attach `child` rigidly. Its transform is read relative to this body.
    pub fn attach(&mut self, child: RigidBody) -> &mut Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: RigidBody) -> Self {
        self.children.push(child);
        self
    }

    /// Mass used by the solver: the explicit one, or the bounding-box volume.
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass.unwrap_or_else(|| self.shape.bounding_volume())
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.mass() == 0.0
    }

    #[must_use]
    pub fn children(&self) -> &[RigidBody] {
        &self.children
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        self.shape.validate()?;
        self.material.validate()?;
        let mass = self.mass();
        if !mass.is_finite() || mass < 0.0 {
            return Err(SceneError::InvalidMass(mass));
        }
        if !self.transform.is_finite() {
            return Err(SceneError::InvalidShape(format!(
                "{} has a non-finite transform",
                self.shape.kind_name()
            )));
        }
        self.children.iter().try_for_each(RigidBody::validate)
    }
}
