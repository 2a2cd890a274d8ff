use lib3ds::math::Vector3;
use lib3ds::node::NO_ID;
use lib3ds::{Camera, File, Key, Light, Material, Mesh, Node, NodeData, NodeType};

use std::f32::consts::PI;

fn cube() -> File {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut file = File::new();
    file.frames = 360;
    for (name, diffuse) in &[
        ("c_tex", [0.588235, 0.588235, 0.588235]),
        ("c_red", [1.0, 0.0, 0.0]),
        ("c_blue", [0.0, 0.0, 1.0]),
    ] {
        let mut m = Material::new(name).unwrap();
        m.diffuse = *diffuse;
        file.insert_material(m, None);
    }
    file.materials[0].texture1_map.name = "cube.tga".into();

    let mut mesh = Mesh::new("cube").unwrap();
    mesh.resize_vertices(8, true, false);
    for i in 0..8 {
        let x = if (i + 1) % 4 < 2 { -10.0 } else { 10.0 };
        let y = if i % 4 < 2 { -10.0 } else { 10.0 };
        let z = if i < 4 { 15.0 } else { -15.0 };
        mesh.vertices[i] = Vector3::new(x, y, z);
        mesh.texcos[i] = [0.25 * (i % 4) as f32, if i < 4 { 1.0 } else { 0.0 }];
    }
    let faces: [[u16; 3]; 12] = [
        [0, 5, 1],
        [0, 4, 5],
        [1, 6, 2],
        [1, 5, 6],
        [2, 6, 7],
        [2, 7, 3],
        [0, 3, 7],
        [0, 7, 4],
        [0, 1, 2],
        [0, 2, 3],
        [4, 7, 6],
        [4, 6, 5],
    ];
    mesh.resize_faces(12);
    for (i, face) in mesh.faces.iter_mut().enumerate() {
        face.index = faces[i];
        face.material = Some(match i {
            0..=7 => 0,
            8..=9 => 1,
            _ => 2,
        });
        face.smoothing_group = 1 << (i / 2);
    }
    let inst = Node::new_mesh_instance(Some(&mesh), Some("01"), None, None, None);
    file.insert_mesh(mesh, None);
    file.append_node(inst, None);

    let mut camera = Camera::new("camera01").unwrap();
    camera.position = Vector3::new(0.0, -100.0, 0.0);
    let mut node = Node::new_camera(&camera);
    if let NodeData::Camera(n) = &mut node.data {
        n.pos_track.keys = (0..=36)
            .map(|i| {
                let a = 2.0 * PI * i as f32 / 36.0;
                Key::new(10 * i, [100.0 * a.cos(), 100.0 * a.sin(), 50.0, 0.0])
            })
            .collect();
    }
    let target = Node::new_camera_target(&camera);
    file.insert_camera(camera, None);
    file.append_node(node, None);
    file.append_node(target, None);

    let mut light = Light::new("spot").unwrap();
    light.spot_light = true;
    light.position = Vector3::new(0.0, 0.0, 80.0);
    light.hotspot = 30.0;
    light.falloff = 45.0;
    let spot = Node::new_spotlight(&light);
    file.insert_light(light, None);
    let parent = file.node_by_name("cube", NodeType::MeshInstance).unwrap();
    file.append_node(spot, Some(parent));
    file
}

#[test]
fn cube_roundtrip_on_disk() {
    let file = cube();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.3ds");
    file.save(&path).unwrap();
    let back = File::open(&path).unwrap();

    assert_eq!(back.frames, 360);
    assert_eq!(back.materials.len(), 3);
    assert_eq!(back.materials[0].texture1_map.name, "cube.tga");
    assert_eq!(back.materials[2].diffuse, [0.0, 0.0, 1.0]);

    let mesh = &back.meshes[0];
    assert_eq!(mesh.vertices.len(), 8);
    assert_eq!(mesh.faces.len(), 12);
    assert_eq!(mesh.texcos.len(), 8);
    for (a, b) in mesh.vertices.iter().zip(&file.meshes[0].vertices) {
        assert!((a - b).x.abs() < 1e-5 && (a - b).y.abs() < 1e-5 && (a - b).z.abs() < 1e-5);
    }
    for (a, b) in mesh.faces.iter().zip(&file.meshes[0].faces) {
        assert_eq!(a.index, b.index);
        assert_eq!(a.material, b.material);
        assert_eq!(a.smoothing_group, b.smoothing_group);
    }

    assert_eq!(back.cameras[0].name, "camera01");
    assert!(back.lights[0].spot_light);
    assert!((back.lights[0].falloff - 45.0).abs() < 1e-5);
}

#[test]
fn node_hierarchy_survives() {
    let back = File::from_bytes(&cube().to_bytes().unwrap()).unwrap();
    assert_eq!(back.nodes.len(), 4);
    assert_eq!(back.nodes.roots().len(), 3);

    let cube = back.node_by_name("cube", NodeType::MeshInstance).unwrap();
    let spot = back.node_by_name("spot", NodeType::Spotlight).unwrap();
    assert_eq!(back.nodes.get(spot).unwrap().parent(), Some(cube));
    assert_eq!(back.nodes.get(cube).unwrap().children(), &[spot]);

    let mut ids: Vec<u16> = back.nodes.iter().map(|(_, n)| n.node_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert!(ids.iter().all(|&id| id != NO_ID));
    assert_eq!(back.minmax_node_id(), (0, 3));
}

#[test]
fn camera_orbits() {
    let mut file = File::from_bytes(&cube().to_bytes().unwrap()).unwrap();
    let cam = file.node_by_name("camera01", NodeType::Camera).unwrap();

    file.eval(90.0);
    let m = file.nodes.get(cam).unwrap().matrix;
    assert!(m[3][0].abs() < 1e-2);
    assert!((m[3][1] - 100.0).abs() < 1e-2);
    assert!((m[3][2] - 50.0).abs() < 1e-4);

    file.eval(180.0);
    let m = file.nodes.get(cam).unwrap().matrix;
    assert!((m[3][0] + 100.0).abs() < 1e-3);
}

#[test]
fn resave_keeps_layout() {
    let first = cube().to_bytes().unwrap();
    let second = File::from_bytes(&first).unwrap().to_bytes().unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(&first[..6], &second[..6]);
}
