//! Angular motors on DOF and hinge joints.

use physics::{Constraint, ConstraintState, Material, RigidBody, Scene, SceneError, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

fn base_on_ground(scene: &mut Scene) -> (physics::BodyId, physics::ConstraintId) {
    let ground = scene
        .add(RigidBody::cuboid(20.0, 0.5, 20.0, Material::default()).with_mass(0.0))
        .unwrap();
    let base = scene
        .add(
            RigidBody::cylinder(4.0, 4.0, 1.0, 50, Material::new(0xffff00, 0.9, 0.3))
                .with_mass(5.0)
                .with_position(Vec3::new(0.0, 0.75, 0.0)),
        )
        .unwrap();
    let joint = scene
        .add_constraint(Constraint::dof(ground, Some(base), Vec3::new(0.0, 1.0, 0.0)))
        .unwrap();
    scene
        .update_constraint(joint, |c| {
            c.set_angular_lower_limit(Vec3::new(0.0, -PI, 0.0))?;
            c.set_angular_upper_limit(Vec3::new(0.0, PI, 0.0))
        })
        .unwrap();
    (base, joint)
}

fn arm_motor(scene: &mut Scene, joint: physics::ConstraintId, velocity: f32) {
    scene
        .update_constraint(joint, |c| {
            c.configure_angular_motor(1, -FRAC_PI_2, FRAC_PI_2, velocity, 200.0)?;
            c.enable_angular_motor(1)
        })
        .unwrap();
}

#[test]
fn enabled_motor_drives_axis_towards_target_velocity() {
    let mut scene = Scene::new();
    let (base, joint) = base_on_ground(&mut scene);
    arm_motor(&mut scene, joint, 1.0);
    assert_eq!(scene.constraint(joint).unwrap().state(), ConstraintState::Motorized);

    for _ in 0..30 {
        scene.simulate(None).unwrap();
    }
    let spin = scene.angular_velocity(base).unwrap().y.abs();
    let yaw = scene.joint_angles(joint).unwrap().y.abs();
    println!("spin={spin:.3} rad/s yaw={yaw:.3} rad");
    assert!(spin > 0.5 && spin < 1.5, "spin should approach 1 rad/s, got {spin}");
    assert!(yaw > 0.2, "base should have turned, yaw={yaw}");
}

#[test]
fn motor_is_clamped_to_its_range() {
    let mut scene = Scene::new();
    let (_, joint) = base_on_ground(&mut scene);
    arm_motor(&mut scene, joint, 1.0);

    // π/2 at 1 rad/s takes ~1.6 s; run well past it.
    for step in 0..300 {
        scene.simulate(None).unwrap();
        let yaw = scene.joint_angles(joint).unwrap().y;
        assert!(yaw.abs() <= FRAC_PI_2 + 0.1, "yaw {yaw:.3} overshot motor range at step {step}");
    }
    let yaw = scene.joint_angles(joint).unwrap().y.abs();
    assert!(yaw > FRAC_PI_2 - 0.15, "motor should reach its range end, yaw={yaw}");
}

#[test]
fn yaw_reads_correctly_past_a_quarter_turn() {
    let mut scene = Scene::new();
    let (base, joint) = base_on_ground(&mut scene);
    scene
        .update_constraint(joint, |c| {
            c.configure_angular_motor(1, -FRAC_PI_2, 2.6, 2.0, 200.0)?;
            c.enable_angular_motor(1)
        })
        .unwrap();

    for _ in 0..240 {
        scene.simulate(None).unwrap();
    }
    let yaw = scene.joint_angles(joint).unwrap().y;
    let rotation = scene.world_transform(base).unwrap().rotation;
    let rotation = if rotation.w < 0.0 { -rotation } else { rotation };
    let body_yaw = 2.0 * rotation.y.atan2(rotation.w);
    println!("joint yaw={yaw:.3} body yaw={body_yaw:.3}");
    assert!(yaw > 2.3 && yaw <= 2.7, "base should turn well past a quarter turn, yaw={yaw}");
    assert!((yaw - body_yaw).abs() < 0.05, "joint yaw {yaw} disagrees with body yaw {body_yaw}");
}

#[test]
fn opposite_velocities_turn_opposite_ways() {
    let mut forward = Scene::new();
    let (_, fj) = base_on_ground(&mut forward);
    arm_motor(&mut forward, fj, 1.0);

    let mut reverse = Scene::new();
    let (_, rj) = base_on_ground(&mut reverse);
    arm_motor(&mut reverse, rj, -1.0);

    for _ in 0..30 {
        forward.simulate(None).unwrap();
        reverse.simulate(None).unwrap();
    }
    let a = forward.joint_angles(fj).unwrap().y;
    let b = reverse.joint_angles(rj).unwrap().y;
    assert!(a * b < 0.0, "expected opposite turns, got {a} and {b}");
}

#[test]
fn disabled_motor_lets_axis_coast_and_keeps_limits() {
    let mut scene = Scene::new();
    let (base, joint) = base_on_ground(&mut scene);
    arm_motor(&mut scene, joint, 1.0);
    for _ in 0..20 {
        scene.simulate(None).unwrap();
    }

    scene
        .update_constraint(joint, |c| c.disable_angular_motor(1))
        .unwrap();
    assert_eq!(scene.constraint(joint).unwrap().state(), ConstraintState::Limited);

    // Push back the other way; with the motor off only this impulse acts.
    scene.set_gravity(Vec3::ZERO).unwrap();
    let before = scene.joint_angles(joint).unwrap().y;
    let drive = before.signum();
    scene
        .apply_torque_impulse(base, Vec3::new(0.0, -drive * 60.0, 0.0))
        .unwrap();
    for _ in 0..30 {
        scene.simulate(None).unwrap();
    }
    let after = scene.joint_angles(joint).unwrap().y;
    assert!(
        (after - before) * drive < -0.05,
        "axis should move freely against the old drive direction: {before} -> {after}"
    );
    assert!(after.abs() <= PI);
}

#[test]
fn enabling_unconfigured_motor_is_an_error() {
    let mut scene = Scene::new();
    let (_, joint) = base_on_ground(&mut scene);
    assert_eq!(
        scene.update_constraint(joint, |c| c.enable_angular_motor(1)),
        Err(SceneError::MotorNotConfigured(1))
    );
    assert_eq!(scene.constraint(joint).unwrap().state(), ConstraintState::Limited);
}

#[test]
fn hinge_motor_spins_wheel() {
    let mut scene = Scene::new();
    scene.set_gravity(Vec3::ZERO).unwrap();
    let wheel = scene
        .add(RigidBody::cylinder(1.0, 1.0, 0.3, 32, Material::default()).with_mass(1.0))
        .unwrap();
    let axle = scene
        .add_constraint(Constraint::hinge(wheel, None, Vec3::ZERO, Vec3::Y).unwrap())
        .unwrap();
    scene
        .update_constraint(axle, |c| {
            c.configure_angular_motor(0, -PI, PI, 2.0, 50.0)?;
            c.enable_angular_motor(0)
        })
        .unwrap();
    for _ in 0..30 {
        scene.simulate(None).unwrap();
    }
    let spin = scene.angular_velocity(wheel).unwrap();
    assert!(spin.y.abs() > 1.0, "wheel should spin about y, got {spin:?}");
    assert!(spin.x.abs() < 0.1 && spin.z.abs() < 0.1);
}
