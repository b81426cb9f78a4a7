//! # Scene
//!
//! The [`Scene`] owns every body and constraint, exposes gravity and a single
//! [`Scene::simulate`] step. Bodies and constraints keep insertion order,
//! which is the order snapshots are produced in; it carries no physical
//! meaning.
//!
//! Constraint solving, contacts and integration are delegated to rapier. The
//! scene's job is bookkeeping: validating configuration up front, keeping the
//! solver joints in sync with their descriptors, and keeping the last valid
//! transforms around so a diverged step can be rolled back.

use std::collections::BTreeMap;

use rapier3d::prelude::{Collider, ColliderHandle, ImpulseJointHandle, RigidBodyHandle};
use tracing::{debug, error, info, trace};

use crate::body::RigidBody;
use crate::constraint::{AxisRange, Constraint};
use crate::convert::{from_isometry, from_vector, to_isometry, to_vector};
use crate::error::{SceneError, StepError};
use crate::joint::{build_joint, guard_limits, JointFrames};
use crate::types::{BodyId, ConstraintId, Material, Shape, Transform, Vec3};
use crate::world::{self, PhysicsWorld};

/// Step used when `simulate` is called without a delta.
pub const DEFAULT_STEP: f32 = 1.0 / 60.0;
/// Larger deltas are clamped to this.
pub const MAX_STEP: f32 = 0.1;
/// Solver substeps per `simulate` call. Bounds how far a joint can travel
/// between two limit checks.
pub const SOLVER_SUBSTEPS: u32 = 8;
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

struct BodyEntry {
    shape: Shape,
    material: Material,
    mass: f32,
    /// Direct parent for attached geometry.
    parent: Option<BodyId>,
    /// Root of the compound this body belongs to (itself for roots).
    root: BodyId,
    /// Offset from the root body. Identity for roots.
    local: Transform,
    handle: RigidBodyHandle,
    collider: ColliderHandle,
    /// Last transform that passed the divergence check. Roots only.
    last_valid: Transform,
}

/// Attached geometry flattened depth first, collider already built.
struct Attachment<'a> {
    body: &'a RigidBody,
    /// Index of the parent in the flattened list; `None` for the root.
    parent: Option<usize>,
    local: Transform,
    collider: Collider,
}

fn flatten_attachments<'a>(
    body: &'a RigidBody,
    parent: Option<usize>,
    parent_local: &Transform,
    out: &mut Vec<Attachment<'a>>,
) -> Result<(), SceneError> {
    for child in &body.children {
        let local = parent_local.mul_transform(&child.transform);
        let collider = world::attachment_collider(child, &local)?;
        out.push(Attachment {
            body: child,
            parent,
            local,
            collider,
        });
        flatten_attachments(child, Some(out.len() - 1), &local, out)?;
    }
    Ok(())
}

struct ConstraintEntry {
    constraint: Constraint,
    frames: JointFrames,
    handle: ImpulseJointHandle,
}

/// Summary of one successful `simulate` call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub dt: f32,
    pub dynamic_bodies: usize,
}

/// Render-facing view of one body after a step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub parent: Option<BodyId>,
    pub shape: Shape,
    pub material: Material,
    pub transform: Transform,
    pub is_static: bool,
}

pub struct Scene {
    world: PhysicsWorld,
    gravity: Vec3,
    bodies: BTreeMap<BodyId, BodyEntry>,
    constraints: BTreeMap<ConstraintId, ConstraintEntry>,
    world_anchor: Option<RigidBodyHandle>,
    next_body: u32,
    next_constraint: u32,
    steps: u64,
    elapsed: f64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: PhysicsWorld::new(DEFAULT_GRAVITY),
            gravity: DEFAULT_GRAVITY,
            bodies: BTreeMap::new(),
            constraints: BTreeMap::new(),
            world_anchor: None,
            next_body: 0,
            next_constraint: 0,
            steps: 0,
            elapsed: 0.0,
        }
    }

    /// Acceleration applied to every dynamic body.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidGravity`] if any component is not finite.
    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<(), SceneError> {
        if !gravity.is_finite() {
            return Err(SceneError::InvalidGravity);
        }
        self.gravity = gravity;
        self.world.gravity = to_vector(gravity);
        let roots: Vec<_> = self.root_handles().collect();
        for handle in roots {
            self.world.wake(handle);
        }
        debug!(?gravity, "gravity updated");
        Ok(())
    }

    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Registers `body` and everything attached to it. Returns the id of the
    /// root; children get consecutive ids after it, depth first.
    ///
    /// # Errors
    ///
    /// Any validation error of the body or its children, or a shape the
    /// solver cannot build a collider for. Every collider is built before
    /// anything is inserted, so nothing is inserted on failure.
    pub fn add(&mut self, body: RigidBody) -> Result<BodyId, SceneError> {
        body.validate()?;
        let root_collider = world::root_collider(&body)?;
        let mut attachments = Vec::new();
        flatten_attachments(&body, None, &Transform::IDENTITY, &mut attachments)?;

        let (handle, collider) = self.world.insert_root(&body, root_collider);
        let id = self.allocate_body();
        self.bodies.insert(
            id,
            BodyEntry {
                shape: body.shape,
                material: body.material,
                mass: body.mass(),
                parent: None,
                root: id,
                local: Transform::IDENTITY,
                handle,
                collider,
                last_valid: body.transform,
            },
        );

        let mut ids: Vec<BodyId> = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let parent = attachment.parent.map_or(id, |i| ids[i]);
            let collider = self.world.insert_attachment(handle, attachment.collider);
            let child = self.allocate_body();
            self.bodies.insert(
                child,
                BodyEntry {
                    shape: attachment.body.shape,
                    material: attachment.body.material,
                    mass: 0.0,
                    parent: Some(parent),
                    root: id,
                    local: attachment.local,
                    handle,
                    collider,
                    last_valid: Transform::IDENTITY,
                },
            );
            ids.push(child);
        }
        info!(
            %id,
            shape = body.shape.kind_name(),
            mass = body.mass(),
            children = body.children.len(),
            "body added"
        );
        Ok(id)
    }

    /// Removes a body, everything attached to it and every constraint that
    /// references it.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] if `id` is not registered.
    pub fn remove(&mut self, id: BodyId) -> Result<(), SceneError> {
        let entry = self.bodies.get(&id).ok_or(SceneError::UnknownBody(id))?;
        let is_root = entry.parent.is_none();
        let handle = entry.handle;

        let doomed: Vec<BodyId> = self
            .bodies
            .keys()
            .copied()
            .filter(|&b| b == id || self.is_descendant(b, id))
            .collect();

        let dropped: Vec<ConstraintId> = self
            .constraints
            .iter()
            .filter(|(_, c)| doomed.iter().any(|&b| c.constraint.references(b)))
            .map(|(&cid, _)| cid)
            .collect();
        for cid in dropped {
            info!(constraint = %cid, body = %id, "dropping constraint of removed body");
            self.remove_constraint(cid)?;
        }

        if is_root {
            self.world.remove_body(handle);
        } else {
            for b in &doomed {
                if let Some(entry) = self.bodies.get(b) {
                    self.world.remove_collider(entry.collider);
                }
            }
        }
        for b in &doomed {
            self.bodies.remove(b);
        }
        info!(%id, removed = doomed.len(), "body removed");
        Ok(())
    }

    fn is_descendant(&self, body: BodyId, ancestor: BodyId) -> bool {
        let mut current = self.bodies.get(&body).and_then(|e| e.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.bodies.get(&parent).and_then(|e| e.parent);
        }
        false
    }

    /// Registers a joint with the solver. Joint frames are anchored at the
    /// bodies' current poses.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] for a body that is not in the scene,
    /// [`SceneError::AttachedBody`] for attached geometry,
    /// [`SceneError::SelfConstraint`] if both ends are the same body.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, SceneError> {
        let handle_a = self.constrainable(constraint.body_a)?;
        let handle_b = match constraint.body_b {
            Some(b) if b == constraint.body_a => return Err(SceneError::SelfConstraint(b)),
            Some(b) => self.constrainable(b)?,
            None => self.anchor_handle(),
        };
        if !constraint.pivot.is_finite() {
            return Err(SceneError::InvalidLimits(format!(
                "pivot {:?} is not finite",
                constraint.pivot
            )));
        }

        let pose_a = self.rapier_pose(handle_a);
        let pose_b = self.rapier_pose(handle_b);
        let frames = JointFrames::anchor(&constraint, &pose_a, &pose_b);
        let joint = build_joint(&constraint, &frames);
        let handle = self.world.impulse_joints.insert(handle_a, handle_b, joint, true);

        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        info!(
            %id,
            kind = constraint.kind_name(),
            body_a = %constraint.body_a,
            body_b = ?constraint.body_b,
            pivot = ?constraint.pivot,
            "constraint added"
        );
        self.constraints.insert(
            id,
            ConstraintEntry {
                constraint,
                frames,
                handle,
            },
        );
        Ok(id)
    }

    /// Applies `f` to a copy of the constraint; on success the copy is stored
    /// and the solver joint is rebuilt. On error nothing changes.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownConstraint`], whatever `f` returns, or
    /// [`SceneError::Unsupported`] if `f` tried to rebind bodies or pivot.
    pub fn update_constraint<T>(
        &mut self,
        id: ConstraintId,
        f: impl FnOnce(&mut Constraint) -> Result<T, SceneError>,
    ) -> Result<T, SceneError> {
        let entry = self
            .constraints
            .get_mut(&id)
            .ok_or(SceneError::UnknownConstraint(id))?;
        let mut updated = entry.constraint.clone();
        let out = f(&mut updated)?;
        if updated.body_a != entry.constraint.body_a
            || updated.body_b != entry.constraint.body_b
            || updated.pivot != entry.constraint.pivot
        {
            return Err(SceneError::Unsupported(
                "rebinding bodies or pivot",
                entry.constraint.kind_name(),
            ));
        }

        if let Some(joint) = self.world.impulse_joints.get_mut(entry.handle) {
            joint.data = build_joint(&updated, &entry.frames);
        }
        debug!(%id, state = ?updated.state(), "constraint reconfigured");
        entry.constraint = updated;

        let bodies: Vec<_> = entry.constraint.bodies().collect();
        for body in bodies {
            if let Some(handle) = self.bodies.get(&body).map(|e| e.handle) {
                self.world.wake(handle);
            }
        }
        Ok(out)
    }

    /// # Errors
    ///
    /// [`SceneError::UnknownConstraint`] if `id` is not registered.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint, SceneError> {
        let entry = self
            .constraints
            .remove(&id)
            .ok_or(SceneError::UnknownConstraint(id))?;
        self.world.impulse_joints.remove(entry.handle, true);
        debug!(%id, "constraint removed");
        Ok(entry.constraint)
    }

    /// Advances every dynamic body by `delta` seconds, or [`DEFAULT_STEP`],
    /// in [`SOLVER_SUBSTEPS`] solver substeps.
    ///
    /// # Errors
    ///
    /// [`StepError::InvalidTimestep`] for a non-finite or non-positive delta.
    /// [`StepError::Diverged`] if the solver produced a non-finite transform;
    /// all bodies are then back at their last valid transforms, at rest.
    pub fn simulate(&mut self, delta: Option<f32>) -> Result<StepReport, StepError> {
        let dt = match delta {
            None => DEFAULT_STEP,
            Some(dt) if dt.is_finite() && dt > 0.0 => dt.min(MAX_STEP),
            Some(dt) => return Err(StepError::InvalidTimestep(dt)),
        };

        let h = dt / SOLVER_SUBSTEPS as f32;
        for _ in 0..SOLVER_SUBSTEPS {
            self.guard_joint_limits(h);
            self.world.step(h);
            if let Some(body) = self.find_diverged() {
                error!(%body, step = self.steps, "solver diverged, restoring last valid transforms");
                self.restore_last_valid();
                return Err(StepError::Diverged { body });
            }
        }

        let mut dynamic_bodies = 0;
        for entry in self.bodies.values_mut().filter(|e| e.parent.is_none()) {
            if let Some(body) = self.world.bodies.get(entry.handle) {
                entry.last_valid = from_isometry(body.position());
                if body.is_dynamic() {
                    dynamic_bodies += 1;
                }
            }
        }

        self.steps += 1;
        self.elapsed += f64::from(dt);
        trace!(step = self.steps, dt, dynamic_bodies, "scene stepped");
        Ok(StepReport {
            step: self.steps,
            dt,
            dynamic_bodies,
        })
    }

    /// Pulls in the angular limits every limited joint is about to cross
    /// within the next substep of `h` seconds.
    fn guard_joint_limits(&mut self, h: f32) {
        for entry in self.constraints.values() {
            let ranges = entry.constraint.angular_ranges();
            if !ranges.iter().any(|r| matches!(r, AxisRange::Limited { .. })) {
                continue;
            }
            let Some(joint) = self.world.impulse_joints.get_mut(entry.handle) else {
                continue;
            };
            let (Some(a), Some(b)) = (
                self.world.bodies.get(joint.body1),
                self.world.bodies.get(joint.body2),
            ) else {
                continue;
            };
            guard_limits(
                &mut joint.data,
                &ranges,
                &entry.frames,
                &from_isometry(a.position()),
                &from_isometry(b.position()),
                from_vector(b.angvel()) - from_vector(a.angvel()),
                h,
            );
        }
    }

    fn find_diverged(&self) -> Option<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, e)| e.parent.is_none())
            .find(|(_, e)| {
                self.world.bodies.get(e.handle).is_some_and(|b| {
                    !from_isometry(b.position()).is_finite()
                        || !from_vector(b.linvel()).is_finite()
                        || !from_vector(b.angvel()).is_finite()
                })
            })
            .map(|(&id, _)| id)
    }

    fn restore_last_valid(&mut self) {
        for entry in self.bodies.values().filter(|e| e.parent.is_none()) {
            if let Some(body) = self.world.bodies.get_mut(entry.handle) {
                body.set_position(to_isometry(&entry.last_valid), true);
                body.set_linvel(to_vector(Vec3::ZERO), true);
                body.set_angvel(to_vector(Vec3::ZERO), true);
            }
        }
    }

    /// Applies an instantaneous linear impulse at the body's center of mass.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] or [`SceneError::AttachedBody`].
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec3) -> Result<(), SceneError> {
        let handle = self.constrainable(id)?;
        if let Some(body) = self.world.bodies.get_mut(handle) {
            body.apply_impulse(to_vector(impulse), true);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] or [`SceneError::AttachedBody`].
    pub fn apply_torque_impulse(&mut self, id: BodyId, impulse: Vec3) -> Result<(), SceneError> {
        let handle = self.constrainable(id)?;
        if let Some(body) = self.world.bodies.get_mut(handle) {
            body.apply_torque_impulse(to_vector(impulse), true);
        }
        Ok(())
    }

    /// Torque that keeps acting on every step until [`Scene::clear_forces`].
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] or [`SceneError::AttachedBody`].
    pub fn add_torque(&mut self, id: BodyId, torque: Vec3) -> Result<(), SceneError> {
        let handle = self.constrainable(id)?;
        if let Some(body) = self.world.bodies.get_mut(handle) {
            body.add_torque(to_vector(torque), true);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`SceneError::UnknownBody`] or [`SceneError::AttachedBody`].
    pub fn clear_forces(&mut self, id: BodyId) -> Result<(), SceneError> {
        let handle = self.constrainable(id)?;
        if let Some(body) = self.world.bodies.get_mut(handle) {
            body.reset_forces(true);
            body.reset_torques(true);
        }
        Ok(())
    }

    /// World transform; attached geometry resolves to parent ∘ local offset.
    #[must_use]
    pub fn world_transform(&self, id: BodyId) -> Option<Transform> {
        let entry = self.bodies.get(&id)?;
        let root = self.rapier_pose(entry.handle);
        Some(root.mul_transform(&entry.local))
    }

    #[must_use]
    pub fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        let entry = self.bodies.get(&id)?;
        self.world
            .bodies
            .get(entry.handle)
            .map(|b| from_vector(b.linvel()))
    }

    #[must_use]
    pub fn angular_velocity(&self, id: BodyId) -> Option<Vec3> {
        let entry = self.bodies.get(&id)?;
        self.world
            .bodies
            .get(entry.handle)
            .map(|b| from_vector(b.angvel()))
    }

    /// Rotation about a hinge's axis since the hinge was added, in `[-π, π]`.
    /// For a DOF joint this is the rotation about its frame's x axis.
    #[must_use]
    pub fn hinge_angle(&self, id: ConstraintId) -> Option<f32> {
        let (entry, pose_a, pose_b) = self.joint_poses(id)?;
        Some(entry.frames.twist(&pose_a, &pose_b))
    }

    /// Rotation of the joint about each axis of its frame, in `[-π, π]`.
    /// `y` is a turntable's yaw.
    #[must_use]
    pub fn joint_angles(&self, id: ConstraintId) -> Option<Vec3> {
        let (entry, pose_a, pose_b) = self.joint_poses(id)?;
        Some(entry.frames.axis_angles(&pose_a, &pose_b))
    }

    /// World-space gap between the two anchor points of a joint.
    #[must_use]
    pub fn joint_separation(&self, id: ConstraintId) -> Option<f32> {
        let (entry, pose_a, pose_b) = self.joint_poses(id)?;
        Some(entry.frames.separation(&pose_a, &pose_b))
    }

    fn joint_poses(&self, id: ConstraintId) -> Option<(&ConstraintEntry, Transform, Transform)> {
        let entry = self.constraints.get(&id)?;
        let joint = self.world.impulse_joints.get(entry.handle)?;
        let pose_a = self.rapier_pose(joint.body1);
        let pose_b = self.rapier_pose(joint.body2);
        Some((entry, pose_a, pose_b))
    }

    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id).map(|e| &e.constraint)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.constraints.iter().map(|(&id, e)| (id, &e.constraint))
    }

    #[must_use]
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    #[must_use]
    pub fn mass(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|e| e.mass)
    }

    #[must_use]
    pub fn parent(&self, id: BodyId) -> Option<BodyId> {
        self.bodies.get(&id).and_then(|e| e.parent)
    }

    /// Body ids in insertion order.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Simulated seconds.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<BodySnapshot> {
        self.bodies.get(&id).map(|entry| self.snapshot_of(id, entry))
    }

    /// Every body with its current world transform, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .map(|(&id, entry)| self.snapshot_of(id, entry))
            .collect()
    }

    fn snapshot_of(&self, id: BodyId, entry: &BodyEntry) -> BodySnapshot {
        BodySnapshot {
            id,
            parent: entry.parent,
            shape: entry.shape,
            material: entry.material,
            transform: self.rapier_pose(entry.handle).mul_transform(&entry.local),
            is_static: self
                .bodies
                .get(&entry.root)
                .map_or(true, |root| root.mass == 0.0),
        }
    }

    fn allocate_body(&mut self) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        id
    }

    fn constrainable(&self, id: BodyId) -> Result<RigidBodyHandle, SceneError> {
        let entry = self.bodies.get(&id).ok_or(SceneError::UnknownBody(id))?;
        if entry.parent.is_some() {
            return Err(SceneError::AttachedBody(id));
        }
        Ok(entry.handle)
    }

    fn anchor_handle(&mut self) -> RigidBodyHandle {
        if let Some(handle) = self.world_anchor {
            return handle;
        }
        let handle = self.world.insert_anchor();
        self.world_anchor = Some(handle);
        handle
    }

    fn rapier_pose(&self, handle: RigidBodyHandle) -> Transform {
        self.world
            .bodies
            .get(handle)
            .map_or(Transform::IDENTITY, |b| from_isometry(b.position()))
    }

    fn root_handles(&self) -> impl Iterator<Item = RigidBodyHandle> + '_ {
        self.bodies
            .values()
            .filter(|e| e.parent.is_none())
            .map(|e| e.handle)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crate_box() -> RigidBody {
        RigidBody::cuboid(1.0, 1.0, 1.0, Material::default())
    }

    #[test]
    fn ids_follow_insertion_order_with_children() {
        let mut scene = Scene::new();
        let ground = scene.add(crate_box().with_mass(0.0)).unwrap();
        let parent = scene
            .add(crate_box().with_child(crate_box().with_position(Vec3::Y)))
            .unwrap();
        let ids: Vec<_> = scene.body_ids().collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ground);
        assert_eq!(ids[1], parent);
        assert_eq!(scene.parent(ids[2]), Some(parent));

        let child = scene.body(ids[2]).unwrap();
        assert!(!child.is_static);
        assert!((child.transform.position - Vec3::Y).length() < 1e-6);
        assert!(scene.body(BodyId(42)).is_none());
    }

    #[test]
    fn nested_children_keep_their_parents_and_offsets() {
        let mut scene = Scene::new();
        let leaf = crate_box().with_position(Vec3::X);
        let branch = crate_box().with_position(Vec3::Y).with_child(leaf);
        let root = scene
            .add(crate_box().with_child(branch).with_child(crate_box().with_position(Vec3::Z)))
            .unwrap();
        let ids: Vec<_> = scene.body_ids().collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(scene.parent(ids[1]), Some(root));
        assert_eq!(scene.parent(ids[2]), Some(ids[1]));
        assert_eq!(scene.parent(ids[3]), Some(root));
        let leaf_pos = scene.world_transform(ids[2]).unwrap().position;
        assert!((leaf_pos - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert_eq!(scene.world.colliders.len(), 4);
        assert_eq!(scene.world.bodies.len(), 1);
    }

    #[test]
    fn rejected_compound_inserts_nothing() {
        let mut scene = Scene::new();
        let broken = crate_box().with_child(RigidBody::cylinder(1.0, 1.0, -3.0, 50, Material::default()));
        let result = scene.add(crate_box().with_child(crate_box()).with_child(broken));
        assert!(matches!(result, Err(SceneError::InvalidShape(_))));
        assert!(scene.is_empty());
        assert_eq!(scene.world.bodies.len(), 0);
        assert_eq!(scene.world.colliders.len(), 0);
        assert_eq!(scene.add(crate_box()).unwrap(), BodyId(0));
    }

    #[test]
    fn simulate_runs_every_substep() {
        let mut scene = Scene::new();
        let stone = scene.add(crate_box()).unwrap();
        let report = scene.simulate(Some(0.08)).unwrap();
        assert!((report.dt - 0.08).abs() < 1e-6);
        // a full step of gravity, whatever the substep count
        let vy = scene.linear_velocity(stone).unwrap().y;
        assert!((vy + 9.81 * 0.08).abs() < 1e-3, "vy={vy}");
    }

    #[test]
    fn constraint_on_missing_body_is_rejected() {
        let mut scene = Scene::new();
        let a = scene.add(crate_box()).unwrap();
        let ghost = BodyId(99);
        let err = scene
            .add_constraint(Constraint::dof(a, Some(ghost), Vec3::ZERO))
            .unwrap_err();
        assert_eq!(err, SceneError::UnknownBody(ghost));
    }

    #[test]
    fn constraint_on_attached_child_is_rejected() {
        let mut scene = Scene::new();
        let a = scene.add(crate_box().with_child(crate_box())).unwrap();
        let child = BodyId(a.0 + 1);
        let err = scene
            .add_constraint(Constraint::dof(a, Some(child), Vec3::ZERO))
            .unwrap_err();
        assert_eq!(err, SceneError::AttachedBody(child));
    }

    #[test]
    fn constraint_to_self_is_rejected() {
        let mut scene = Scene::new();
        let a = scene.add(crate_box()).unwrap();
        assert_eq!(
            scene.add_constraint(Constraint::dof(a, Some(a), Vec3::ZERO)),
            Err(SceneError::SelfConstraint(a))
        );
    }

    #[test]
    fn invalid_timestep_is_rejected_without_stepping() {
        let mut scene = Scene::new();
        scene.add(crate_box()).unwrap();
        assert_eq!(
            scene.simulate(Some(-1.0)),
            Err(StepError::InvalidTimestep(-1.0))
        );
        assert_eq!(scene.step_count(), 0);
    }

    #[test]
    fn large_delta_is_clamped() {
        let mut scene = Scene::new();
        let report = scene.simulate(Some(5.0)).unwrap();
        assert!((report.dt - MAX_STEP).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_update_keeps_previous_configuration() {
        let mut scene = Scene::new();
        let a = scene.add(crate_box().with_mass(0.0)).unwrap();
        let b = scene.add(crate_box().with_position(Vec3::Y)).unwrap();
        let id = scene
            .add_constraint(Constraint::hinge(a, Some(b), Vec3::ZERO, Vec3::Z).unwrap())
            .unwrap();
        scene
            .update_constraint(id, |c| c.set_limits(-1.0, 1.0, 0.0, 0.0))
            .unwrap();
        let before = scene.constraint(id).cloned();
        assert!(scene
            .update_constraint(id, |c| c.set_limits(2.0, 1.0, 0.0, 0.0))
            .is_err());
        assert_eq!(scene.constraint(id).cloned(), before);
    }

    #[test]
    fn removing_a_body_drops_its_constraints_and_children() {
        let mut scene = Scene::new();
        let ground = scene.add(crate_box().with_mass(0.0)).unwrap();
        let arm = scene
            .add(crate_box().with_position(Vec3::Y).with_child(crate_box()))
            .unwrap();
        let joint = scene
            .add_constraint(Constraint::dof(ground, Some(arm), Vec3::ZERO))
            .unwrap();
        scene.remove(arm).unwrap();
        assert_eq!(scene.len(), 1);
        assert!(scene.constraint(joint).is_none());
        assert!(scene.simulate(None).is_ok());
    }
}
