//! Thin owner of the rapier pipeline state. Everything rapier-specific that
//! is not joint translation lives here.

use rapier3d::prelude::*;

use crate::body::RigidBody;
use crate::convert::{to_isometry, to_point, to_vector};
use crate::error::SceneError;
use crate::types::{Shape, Transform, Vec3};

/// Hull resolution for tapered cylinders. Independent of the rendered
/// radial segment count.
const HULL_SEGMENTS: usize = 24;

/// Solver passes per substep. Above rapier's defaults so a joint chain
/// under heavy load converges within one substep.
const VELOCITY_ITERATIONS: usize = 16;
const STABILIZATION_ITERATIONS: usize = 2;

pub(crate) struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    pub islands: IslandManager,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters {
                max_velocity_iterations: VELOCITY_ITERATIONS,
                max_stabilization_iterations: STABILIZATION_ITERATIONS,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Inserts the solver body for a root descriptor with its primary
    /// collider, built beforehand by [`root_collider`].
    pub fn insert_root(
        &mut self,
        body: &RigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let builder = if body.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let handle = self
            .bodies
            .insert(builder.position(to_isometry(&body.transform)).build());
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        (handle, collider)
    }

    /// Adds a collider built by [`attachment_collider`] to `parent`.
    pub fn insert_attachment(&mut self, parent: RigidBodyHandle, collider: Collider) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Fixed, collider-less body standing in for "the world" in joints.
    pub fn insert_anchor(&mut self) -> RigidBodyHandle {
        self.bodies.insert(RigidBodyBuilder::fixed().build())
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true);
    }

    pub fn wake(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.wake_up(true);
        }
    }
}

/// Primary collider of a root body. Carries the body's whole mass.
pub fn root_collider(body: &RigidBody) -> Result<Collider, SceneError> {
    let mut collider = collider_for(&body.shape)?
        .friction(body.material.friction)
        .restitution(body.material.restitution);
    if !body.is_static() {
        collider = collider.mass(body.mass());
    }
    Ok(collider.build())
}

/// Massless collider for attached geometry at `local`, relative to the root.
pub fn attachment_collider(body: &RigidBody, local: &Transform) -> Result<Collider, SceneError> {
    Ok(collider_for(&body.shape)?
        .position(to_isometry(local))
        .friction(body.material.friction)
        .restitution(body.material.restitution)
        .density(0.0)
        .build())
}

fn collider_for(shape: &Shape) -> Result<ColliderBuilder, SceneError> {
    match *shape {
        Shape::Box {
            width,
            height,
            depth,
        } => Ok(ColliderBuilder::cuboid(width / 2.0, height / 2.0, depth / 2.0)),
        Shape::Cylinder {
            radius_top,
            radius_bottom,
            height,
            ..
        } if radius_top == radius_bottom => Ok(ColliderBuilder::cylinder(height / 2.0, radius_top)),
        Shape::Cylinder {
            radius_top,
            radius_bottom,
            height,
            ..
        } => {
            let half = height / 2.0;
            let points: Vec<_> = ring(radius_top, half)
                .chain(ring(radius_bottom, -half))
                .collect();
            ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                SceneError::InvalidShape(format!(
                    "cannot build hull for tapered cylinder ({radius_top}, {radius_bottom}, {height})"
                ))
            })
        }
    }
}

fn ring(radius: f32, y: f32) -> impl Iterator<Item = Point<Real>> {
    let count = if radius > 0.0 { HULL_SEGMENTS } else { 1 };
    (0..count).map(move |i| {
        let theta = std::f32::consts::TAU * i as f32 / HULL_SEGMENTS as f32;
        to_point(Vec3::new(radius * theta.cos(), y, radius * theta.sin()))
    })
}
