use std::fs;
use std::path::Path;

fn validate_shader(path: &Path) -> naga::Module {
    let src = fs::read_to_string(path).expect("read shader");
    let module = naga::front::wgsl::parse_str(&src).expect("wgsl parse");
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).expect("wgsl validate");
    module
}

#[test]
fn compile_scene_shader() {
    let shader = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/shaders/scene.wgsl");
    let module = validate_shader(&shader);

    let entry_points: Vec<(&str, naga::ShaderStage)> = module
        .entry_points
        .iter()
        .map(|ep| (ep.name.as_str(), ep.stage))
        .collect();
    assert!(entry_points.contains(&("vs_main", naga::ShaderStage::Vertex)));
    assert!(entry_points.contains(&("fs_main", naga::ShaderStage::Fragment)));
}

#[test]
fn vertex_stage_reads_every_instance_field() {
    let shader = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/shaders/scene.wgsl");
    let module = validate_shader(&shader);
    let vs = module
        .entry_points
        .iter()
        .find(|ep| ep.name == "vs_main")
        .expect("vertex entry point");

    // locations 0..=1 per vertex, 2..=8 per instance
    let mut locations = Vec::new();
    for arg in &vs.function.arguments {
        let ty = &module.types[arg.ty];
        if let naga::TypeInner::Struct { members, .. } = &ty.inner {
            for member in members {
                if let Some(naga::Binding::Location { location, .. }) = member.binding {
                    locations.push(location);
                }
            }
        }
    }
    locations.sort_unstable();
    assert_eq!(locations, (0..=8).collect::<Vec<u32>>());
}
