use anyhow::*;
use lib3ds::math::{matrix, vector};
use lib3ds::{File, Node, NodeData};
use log::*;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::descriptor::Config;

/// Running offsets into the global OBJ index lists.
#[derive(Default)]
struct Offsets {
    vertices: usize,
    texcos: usize,
    normals: usize,
}

/// Material names made safe for MTL. Falls back to `mat_<i>` when sanitizing collides.
fn material_names(file: &File, prefix: &str) -> Vec<String> {
    let names: Vec<String> = file
        .materials
        .iter()
        .map(|m| {
            let clean: String = m
                .name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect();
            format!("{}{}", prefix, clean)
        })
        .collect();
    let unique = names.iter().enumerate().all(|(i, n)| !names[..i].contains(n));
    if unique {
        names
    } else {
        (0..names.len()).map(|i| format!("{}mat_{}", prefix, i)).collect()
    }
}

fn write_mtl<W: Write>(o: &mut W, file: &File, names: &[String]) -> Result<()> {
    writeln!(o, "# Wavefront material file")?;
    writeln!(o)?;
    for (m, name) in file.materials.iter().zip(names) {
        writeln!(o, "newmtl {}", name)?;
        writeln!(o, "Ka {} {} {}", m.ambient[0], m.ambient[1], m.ambient[2])?;
        writeln!(o, "Kd {} {} {}", m.diffuse[0], m.diffuse[1], m.diffuse[2])?;
        writeln!(o, "Ks {} {} {}", m.specular[0], m.specular[1], m.specular[2])?;
        writeln!(o, "illum 2")?;
        writeln!(o, "Ns {}", 2f32.powf(10.0 * m.shininess + 1.0))?;
        writeln!(o, "d {}", 1.0 - m.transparency)?;
        for (key, map) in &[
            ("map_Kd", &m.texture1_map),
            ("map_bump", &m.bump_map),
            ("map_d", &m.opacity_map),
            ("refl", &m.reflection_map),
            ("map_Ks", &m.specular_map),
        ] {
            if !map.name.is_empty() {
                writeln!(o, "{} {}", key, map.name)?;
            }
        }
        writeln!(o)?;
    }
    Ok(())
}

fn write_mesh<W: Write>(
    o: &mut W,
    file: &File,
    node: &Node,
    names: &[String],
    config: &Config,
    offsets: &mut Offsets,
) -> Result<()> {
    let inst = match &node.data {
        NodeData::MeshInstance(n) => n,
        _ => return Ok(()),
    };
    let mesh = match file.mesh_for_node(node) {
        Some(mesh) if !mesh.vertices.is_empty() => mesh,
        _ => return Ok(()),
    };

    writeln!(o, "# object {}", node.name)?;
    let group = if inst.instance_name.is_empty() { &node.name } else { &inst.instance_name };
    writeln!(o, "g {}", group)?;

    let inv = matrix::inverse(&mesh.matrix).unwrap_or_else(|| {
        warn!("mesh {} has a singular matrix", mesh.name);
        matrix::identity()
    });
    let m = matrix::translate(node.matrix, -inst.pivot) * inv;
    for &v in &mesh.vertices {
        let v = vector::transform(&m, v);
        writeln!(o, "v {} {} {}", v.x, v.y, v.z)?;
    }
    writeln!(o, "# {} vertices", mesh.vertices.len())?;

    let texcos = config.texcos && !mesh.texcos.is_empty();
    if texcos {
        for uv in &mesh.texcos {
            writeln!(o, "vt {} {}", uv[0], uv[1])?;
        }
        writeln!(o, "# {} texture vertices", mesh.texcos.len())?;
    }

    let normals = config.normals && !mesh.faces.is_empty();
    if normals {
        let vn = mesh.calculate_vertex_normals();
        for n in &vn {
            writeln!(o, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        writeln!(o, "# {} normals", vn.len())?;
    }

    let mut current = None;
    for (i, face) in mesh.faces.iter().enumerate() {
        if face.material != current {
            current = face.material;
            if let Some(name) = current.and_then(|m| names.get(m)) {
                writeln!(o, "usemtl {}", name)?;
            }
        }
        write!(o, "f")?;
        for j in 0..3 {
            let index = face.index[j] as usize;
            write!(o, " {}", index + offsets.vertices + 1)?;
            if texcos {
                write!(o, "/{}", index + offsets.texcos + 1)?;
            } else if normals {
                write!(o, "/")?;
            }
            if normals {
                write!(o, "/{}", 3 * i + j + offsets.normals + 1)?;
            }
        }
        writeln!(o)?;
    }

    offsets.vertices += mesh.vertices.len();
    if texcos {
        offsets.texcos += mesh.texcos.len();
    }
    if normals {
        offsets.normals += 3 * mesh.faces.len();
    }
    Ok(())
}

pub fn run(config: &Config, input: &Path, obj: &Path, mtl: &Path) -> Result<()> {
    let mut file = File::open(input).with_context(|| format!("failed to load {}", input.display()))?;
    let names = material_names(&file, &config.material_prefix);

    let mut o = BufWriter::new(
        fs::File::create(mtl).with_context(|| format!("failed to create {}", mtl.display()))?,
    );
    write_mtl(&mut o, &file, &names)?;
    o.flush()?;

    if file.nodes.is_empty() {
        file.create_nodes_for_meshes();
    }
    file.eval(config.frame);

    let mut o = BufWriter::new(
        fs::File::create(obj).with_context(|| format!("failed to create {}", obj.display()))?,
    );
    writeln!(o, "# Wavefront OBJ file")?;
    writeln!(o)?;
    let mtllib = mtl.file_name().map_or_else(
        || mtl.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );
    writeln!(o, "mtllib {}", mtllib)?;

    let mut offsets = Offsets::default();
    for i in file.nodes.preorder() {
        if let Some(node) = file.nodes.get(i) {
            write_mesh(&mut o, &file, node, &names, config, &mut offsets)?;
        }
    }
    o.flush()?;
    info!("wrote {} vertices to {}", offsets.vertices, obj.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use lib3ds::Material;

    #[test]
    fn names_are_sanitized() {
        let mut file = File::new();
        file.materials.push(Material::new("red paint").unwrap());
        file.materials.push(Material::new("blue").unwrap());
        assert_eq!(material_names(&file, ""), vec!["red_paint", "blue"]);

        file.materials.push(Material::new("red-paint").unwrap());
        assert_eq!(material_names(&file, "x_"), vec!["x_mat_0", "x_mat_1", "x_mat_2"]);
    }
}
