use physics::{Material, RigidBody, Scene, SceneError, Vec3};

fn drop_onto_ground(material: Material) -> (Scene, physics::BodyId) {
    let mut scene = Scene::new();
    scene
        .add(RigidBody::cuboid(20.0, 0.5, 20.0, material).with_mass(0.0))
        .unwrap();
    let block = scene
        .add(
            RigidBody::cuboid(1.0, 1.0, 1.0, material)
                .with_mass(1.0)
                .with_position(Vec3::new(0.0, 4.0, 0.0)),
        )
        .unwrap();
    (scene, block)
}

#[test]
fn restitution_bouncy_vs_damped() {
    let (mut bouncy, bouncy_block) = drop_onto_ground(Material::new(0xffffff, 0.5, 0.9));
    let (mut damped, damped_block) = drop_onto_ground(Material::new(0xffffff, 0.5, 0.0));

    let mut bouncy_peak = f32::MIN;
    let mut damped_peak = f32::MIN;
    let mut bounced = false;
    for _ in 0..180 {
        bouncy.simulate(None).unwrap();
        damped.simulate(None).unwrap();
        let bv = bouncy.linear_velocity(bouncy_block).unwrap().y;
        if bv > 0.5 {
            bounced = true;
        }
        if bounced {
            bouncy_peak = bouncy_peak.max(bouncy.world_transform(bouncy_block).unwrap().position.y);
            damped_peak = damped_peak.max(damped.world_transform(damped_block).unwrap().position.y);
        }
    }

    println!("bouncy peak: {bouncy_peak:.3}, damped peak: {damped_peak:.3}");
    assert!(bounced, "bouncy block never left the ground");
    assert!(bouncy_peak > damped_peak + 0.5, "bouncy material should rebound higher");
}

#[test]
fn friction_rough_vs_slippery() {
    let slide = |friction: f32| {
        let material = Material::new(0xffffff, friction, 0.0);
        let mut scene = Scene::new();
        scene
            .add(RigidBody::cuboid(40.0, 0.5, 40.0, material).with_mass(0.0))
            .unwrap();
        let block = scene
            .add(
                RigidBody::cuboid(1.0, 1.0, 1.0, material)
                    .with_mass(1.0)
                    .with_position(Vec3::new(0.0, 0.75, 0.0)),
            )
            .unwrap();
        scene.apply_impulse(block, Vec3::new(4.0, 0.0, 0.0)).unwrap();
        for _ in 0..120 {
            scene.simulate(None).unwrap();
        }
        scene.world_transform(block).unwrap().position.x
    };

    let slippery = slide(0.0);
    let rough = slide(0.9);
    println!("slippery slid {slippery:.3}, rough slid {rough:.3}");
    assert!(slippery > rough + 1.0, "low friction should slide further");
}

#[test]
fn invalid_material_is_rejected() {
    let mut scene = Scene::new();
    let err = scene
        .add(RigidBody::cuboid(1.0, 1.0, 1.0, Material::new(0xffffff, -1.0, 0.0)))
        .unwrap_err();
    assert!(matches!(err, SceneError::InvalidMaterial(_)), "got {err:?}");
    assert!(scene.is_empty());
}
