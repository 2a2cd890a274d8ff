use anyhow::*;
use lib3ds::math::Vector3;
use lib3ds::{Camera, File, Key, Material, Mesh, Node, NodeData};

use std::f32::consts::PI;

const VERTICES: [[f32; 3]; 8] = [
    [-10.0, -10.0, 15.0],
    [10.0, -10.0, 15.0],
    [10.0, 10.0, 15.0],
    [-10.0, 10.0, 15.0],
    [-10.0, -10.0, -15.0],
    [10.0, -10.0, -15.0],
    [10.0, 10.0, -15.0],
    [-10.0, 10.0, -15.0],
];

// texture origin is the bottom left corner
const TEXCOS: [[f32; 2]; 8] = [
    [0.00, 1.0],
    [0.25, 1.0],
    [0.50, 1.0],
    [0.75, 1.0],
    [0.00, 0.0],
    [0.25, 0.0],
    [0.50, 0.0],
    [0.75, 0.0],
];

// counter clockwise
const FACES: [[u16; 3]; 12] = [
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

/// A textured cube with red and blue caps, watched by a camera circling it once over
/// 360 frames.
pub fn scene() -> Result<File> {
    let mut file = File::new();
    file.frames = 360;

    let mut tex = Material::new("c_tex")?;
    tex.texture1_map.name = "cube.tga".into();
    tex.texture1_map.percent = 1.0;
    file.insert_material(tex, None);

    let mut red = Material::new("c_red")?;
    red.diffuse = [1.0, 0.0, 0.0];
    file.insert_material(red, None);

    let mut blue = Material::new("c_blue")?;
    blue.diffuse = [0.0, 0.0, 1.0];
    file.insert_material(blue, None);

    let mut mesh = Mesh::new("cube")?;
    mesh.resize_vertices(VERTICES.len(), true, false);
    for (i, v) in VERTICES.iter().enumerate() {
        mesh.vertices[i] = Vector3::new(v[0], v[1], v[2]);
        mesh.texcos[i] = TEXCOS[i];
    }
    mesh.resize_faces(FACES.len());
    for (i, face) in mesh.faces.iter_mut().enumerate() {
        face.index = FACES[i];
        face.material = Some(match i {
            0..=7 => 0,
            8..=9 => 1,
            _ => 2,
        });
    }
    let inst = Node::new_mesh_instance(Some(&mesh), Some("01"), None, None, None);
    file.insert_mesh(mesh, None);
    file.append_node(inst, None);

    let mut camera = Camera::new("camera01")?;
    camera.position = Vector3::new(0.0, -100.0, 0.0);
    camera.target = Vector3::new(0.0, 0.0, 0.0);

    let mut node = Node::new_camera(&camera);
    let target = Node::new_camera_target(&camera);
    if let NodeData::Camera(n) = &mut node.data {
        n.pos_track.keys = (0..=36)
            .map(|i| {
                let a = 2.0 * PI * i as f32 / 36.0;
                Key::new(10 * i, [100.0 * a.cos(), 100.0 * a.sin(), 50.0, 0.0])
            })
            .collect();
    }
    file.insert_camera(camera, None);
    file.append_node(node, None);
    file.append_node(target, None);
    Ok(file)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scene_survives_a_roundtrip() {
        let file = scene().unwrap();
        let back = File::from_bytes(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(back.meshes[0].faces.len(), 12);
        assert_eq!(back.materials.len(), 3);
        assert_eq!(back.nodes.len(), 3);
        assert_eq!(back.frames, 360);
    }
}
