use criterion::{criterion_group, criterion_main, Criterion};
use physics::{Constraint, Material, RigidBody, Scene, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, PI};

/// Ground, turntable base and two hinged segments with the base motor on.
fn arm_scene() -> Scene {
    let mut scene = Scene::new();
    let ground = scene
        .add(RigidBody::cuboid(20.0, 0.5, 20.0, Material::default()).with_mass(0.0))
        .unwrap();
    let base = scene
        .add(RigidBody::cylinder(4.0, 4.0, 1.0, 50, Material::default()).with_position(Vec3::new(0.0, 0.75, 0.0)))
        .unwrap();
    let middle = scene
        .add(RigidBody::cuboid(1.0, 5.0, 3.0, Material::default()).with_position(Vec3::new(0.0, 8.25, 0.0)))
        .unwrap();
    let end = scene
        .add(RigidBody::cuboid(1.0, 3.0, 3.0, Material::default()).with_position(Vec3::new(0.0, 13.25, 0.0)))
        .unwrap();

    let turntable = scene
        .add_constraint(Constraint::dof(ground, Some(base), Vec3::new(0.0, 1.0, 0.0)))
        .unwrap();
    scene
        .update_constraint(turntable, |c| {
            c.set_angular_lower_limit(Vec3::new(0.0, -PI, 0.0))?;
            c.set_angular_upper_limit(Vec3::new(0.0, PI, 0.0))?;
            c.configure_angular_motor(1, -FRAC_PI_2, FRAC_PI_2, 1.0, 200.0)?;
            c.enable_angular_motor(1)
        })
        .unwrap();
    for (a, b, y) in [(middle, base, 4.75), (middle, end, 12.0)] {
        let hinge = scene
            .add_constraint(Constraint::hinge(a, Some(b), Vec3::new(0.0, y, 0.0), Vec3::Z).unwrap())
            .unwrap();
        scene
            .update_constraint(hinge, |c| c.set_limits(-FRAC_PI_3, FRAC_PI_3, 0.0, 0.0))
            .unwrap();
    }
    scene
}

fn bench_arm_step(c: &mut Criterion) {
    c.bench_function("arm_scene_step", |b| {
        let mut scene = arm_scene();
        b.iter(|| scene.simulate(None).unwrap());
    });
    c.bench_function("arm_scene_build_and_run_60", |b| {
        b.iter(|| {
            let mut scene = arm_scene();
            for _ in 0..60 {
                scene.simulate(None).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_arm_step);
criterion_main!(benches);
