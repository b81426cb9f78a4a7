use physics::{Material, RigidBody, Scene, SceneError, Vec3};

#[test]
fn heavier_body_accelerates_less() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    scene.set_gravity(Vec3::ZERO)?;
    let light = scene.add(RigidBody::cuboid(1.0, 1.0, 1.0, Material::default()).with_mass(1.0))?;
    let heavy = scene.add(
        RigidBody::cuboid(1.0, 1.0, 1.0, Material::default())
            .with_mass(2.0)
            .with_position(Vec3::new(5.0, 0.0, 0.0)),
    )?;
    scene.apply_impulse(light, Vec3::X)?;
    scene.apply_impulse(heavy, Vec3::X)?;
    scene.simulate(None)?;

    let light_vx = scene.linear_velocity(light).unwrap_or_default().x;
    let heavy_vx = scene.linear_velocity(heavy).unwrap_or_default().x;
    assert!((light_vx - 1.0).abs() < 1e-3, "light vx={light_vx}");
    assert!((heavy_vx - 0.5).abs() < 1e-3, "heavy vx={heavy_vx}");
    Ok(())
}

#[test]
fn default_mass_follows_bounding_volume() {
    let mut scene = Scene::new();
    let block = scene
        .add(RigidBody::cuboid(1.0, 5.0, 3.0, Material::default()))
        .unwrap();
    let drum = scene
        .add(RigidBody::cylinder(1.0, 1.0, 3.0, 16, Material::default()).with_position(Vec3::X * 5.0))
        .unwrap();
    assert!((scene.mass(block).unwrap() - 15.0).abs() < 1e-4);
    assert!((scene.mass(drum).unwrap() - 12.0).abs() < 1e-4);
}

#[test]
fn attached_geometry_adds_no_mass() {
    let mut scene = Scene::new();
    scene.set_gravity(Vec3::ZERO).unwrap();
    let bare = scene
        .add(RigidBody::cuboid(1.0, 1.0, 1.0, Material::default()).with_mass(1.0))
        .unwrap();
    let loaded = scene
        .add(
            RigidBody::cuboid(1.0, 1.0, 1.0, Material::default())
                .with_mass(1.0)
                .with_position(Vec3::new(0.0, 10.0, 0.0))
                .with_child(
                    RigidBody::cuboid(3.0, 3.0, 3.0, Material::default())
                        .with_position(Vec3::new(0.0, 2.0, 0.0)),
                ),
        )
        .unwrap();
    scene.apply_impulse(bare, Vec3::X).unwrap();
    scene.apply_impulse(loaded, Vec3::X).unwrap();
    scene.simulate(None).unwrap();

    let a = scene.linear_velocity(bare).unwrap().x;
    let b = scene.linear_velocity(loaded).unwrap().x;
    assert!((a - b).abs() < 1e-3, "child changed the compound's mass: {a} vs {b}");
}

#[test]
fn negative_mass_is_rejected() {
    let mut scene = Scene::new();
    assert_eq!(
        scene.add(RigidBody::cuboid(1.0, 1.0, 1.0, Material::default()).with_mass(-1.0)),
        Err(SceneError::InvalidMass(-1.0))
    );
}
