//! The robotic arm scene.
//!
//! A static ground slab carries a turntable base (DOF joint, yaw only) with
//! an upright mount. The middle segment hinges on the base about Z, the end
//! segment hinges on the middle segment about Z. Each segment carries a
//! joint cylinder as attached geometry.

use std::f32::consts::FRAC_PI_2;

use anyhow::{Context, Result};
use physics::{BodyId, Constraint, ConstraintId, Material, Quat, RigidBody, Scene, Vec3};
use tracing::info;

use crate::config::{ArmConfig, SceneConfig, SurfaceConfig};

const BASE_POSITION: Vec3 = Vec3::new(0.0, 0.75, 0.0);
const MOUNT_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
const MIDDLE_POSITION: Vec3 = Vec3::new(0.0, 8.25, 0.0);
const MIDDLE_JOINT_OFFSET: Vec3 = Vec3::new(0.0, -3.0, 0.0);
const END_POSITION: Vec3 = Vec3::new(0.0, 13.25, 0.0);
const END_JOINT_OFFSET: Vec3 = Vec3::new(0.0, -1.5, 0.0);

const TURNTABLE_PIVOT: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const SHOULDER_PIVOT: Vec3 = Vec3::new(0.0, 4.75, 0.0);
const ELBOW_PIVOT: Vec3 = Vec3::new(0.0, 12.0, 0.0);

/// Ids of every part of the arm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArmHandles {
    pub ground: BodyId,
    pub base: BodyId,
    pub mount: BodyId,
    pub middle: BodyId,
    pub shoulder_cylinder: BodyId,
    pub end: BodyId,
    pub elbow_cylinder: BodyId,
    /// Ground to base, yaw only.
    pub turntable: ConstraintId,
    /// Middle segment to base.
    pub shoulder: ConstraintId,
    /// Middle segment to end segment.
    pub elbow: ConstraintId,
}

impl ArmHandles {
    #[must_use]
    pub fn hinges(&self) -> [ConstraintId; 2] {
        [self.shoulder, self.elbow]
    }
}

fn material(surface: &SurfaceConfig) -> Material {
    Material::new(surface.color, surface.friction, surface.restitution)
}

fn with_optional_mass(body: RigidBody, mass: Option<f32>) -> RigidBody {
    match mass {
        Some(mass) => body.with_mass(mass),
        None => body,
    }
}

fn box_of(size: [f32; 3], surface: &SurfaceConfig) -> RigidBody {
    RigidBody::cuboid(size[0], size[1], size[2], material(surface))
}

/// Joint cylinder lying along Z.
fn joint_cylinder(arm: &ArmConfig, offset: Vec3) -> RigidBody {
    RigidBody::cylinder(
        arm.joint_radius,
        arm.joint_radius,
        arm.joint_length,
        arm.joint_segments,
        material(&arm.joint_surface),
    )
    .with_mass(0.0)
    .with_position(offset)
    .with_rotation(Quat::from_rotation_x(FRAC_PI_2))
}

fn first_child(scene: &Scene, parent: BodyId) -> Result<BodyId> {
    scene
        .body_ids()
        .find(|&id| scene.parent(id) == Some(parent))
        .with_context(|| format!("{parent} has no attached geometry"))
}

/// Builds the ground and the arm with all three joints configured.
///
/// # Errors
///
/// Any body or constraint the scene rejects, naming the part.
pub fn build_scene(config: &SceneConfig) -> Result<(Scene, ArmHandles)> {
    let arm = &config.arm;
    let mut scene = Scene::new();
    scene
        .set_gravity(config.gravity())
        .context("invalid gravity")?;

    let ground = scene
        .add(box_of(config.ground.size, &config.ground.surface).with_mass(0.0))
        .context("failed to add ground")?;

    let base = RigidBody::cylinder(
        arm.base_radius,
        arm.base_radius,
        arm.base_height,
        arm.base_segments,
        material(&arm.joint_surface),
    )
    .with_position(BASE_POSITION)
    .with_child(
        box_of(arm.mount_size, &arm.arm_surface)
            .with_mass(0.0)
            .with_position(MOUNT_OFFSET),
    );
    let base = scene
        .add(with_optional_mass(base, arm.base_mass))
        .context("failed to add arm base")?;
    let mount = first_child(&scene, base)?;

    let turntable = scene
        .add_constraint(Constraint::dof(ground, Some(base), TURNTABLE_PIVOT))
        .context("failed to join base to ground")?;
    scene
        .update_constraint(turntable, |c| {
            c.set_angular_lower_limit(Vec3::new(0.0, -arm.base_yaw_limit, 0.0))?;
            c.set_angular_upper_limit(Vec3::new(0.0, arm.base_yaw_limit, 0.0))
        })
        .context("failed to limit base yaw")?;

    let middle = box_of(arm.middle_size, &arm.arm_surface)
        .with_position(MIDDLE_POSITION)
        .with_child(joint_cylinder(arm, MIDDLE_JOINT_OFFSET));
    let middle = scene
        .add(with_optional_mass(middle, arm.middle_mass))
        .context("failed to add middle segment")?;
    let shoulder_cylinder = first_child(&scene, middle)?;
    let shoulder = add_hinge(&mut scene, middle, base, SHOULDER_PIVOT, arm.hinge_limit)
        .context("failed to add shoulder hinge")?;

    let end = box_of(arm.end_size, &arm.arm_surface)
        .with_position(END_POSITION)
        .with_child(joint_cylinder(arm, END_JOINT_OFFSET));
    let end = scene
        .add(with_optional_mass(end, arm.end_mass))
        .context("failed to add end segment")?;
    let elbow_cylinder = first_child(&scene, end)?;
    let elbow = add_hinge(&mut scene, middle, end, ELBOW_PIVOT, arm.hinge_limit)
        .context("failed to add elbow hinge")?;

    info!(
        bodies = scene.len(),
        constraints = scene.constraints().count(),
        "arm scene built"
    );
    Ok((
        scene,
        ArmHandles {
            ground,
            base,
            mount,
            middle,
            shoulder_cylinder,
            end,
            elbow_cylinder,
            turntable,
            shoulder,
            elbow,
        },
    ))
}

fn add_hinge(
    scene: &mut Scene,
    a: BodyId,
    b: BodyId,
    pivot: Vec3,
    limit: f32,
) -> Result<ConstraintId> {
    let hinge = scene.add_constraint(Constraint::hinge(a, Some(b), pivot, Vec3::Z)?)?;
    scene.update_constraint(hinge, |c| c.set_limits(-limit, limit, 0.0, 0.0))?;
    Ok(hinge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::ConstraintState;

    #[test]
    fn stock_scene_has_every_part() {
        let (scene, arm) = build_scene(&SceneConfig::default()).unwrap();
        assert_eq!(scene.len(), 7);
        assert_eq!(scene.constraints().count(), 3);
        assert_eq!(scene.parent(arm.mount), Some(arm.base));
        assert_eq!(scene.parent(arm.shoulder_cylinder), Some(arm.middle));
        assert_eq!(scene.parent(arm.elbow_cylinder), Some(arm.end));
        for id in [arm.turntable, arm.shoulder, arm.elbow] {
            assert_eq!(scene.constraint(id).unwrap().state(), ConstraintState::Limited);
        }
    }

    #[test]
    fn attached_parts_sit_at_their_offsets() {
        let (scene, arm) = build_scene(&SceneConfig::default()).unwrap();
        let mount = scene.world_transform(arm.mount).unwrap();
        assert!(mount.position.abs_diff_eq(Vec3::new(0.0, 2.75, 0.0), 1e-5));
        let cylinder = scene.world_transform(arm.shoulder_cylinder).unwrap();
        assert!(cylinder.position.abs_diff_eq(Vec3::new(0.0, 5.25, 0.0), 1e-5));
        // Lying along Z.
        let axis = cylinder.rotation * Vec3::Y;
        assert!(axis.z.abs() > 0.999);
    }
}
