use anyhow::*;
use lib3ds::{File, Mesh, Node, NodeData, NodeTree, NodeType, Reader};
use log::*;
use structopt::StructOpt;

use std::fs;
use std::path::PathBuf;

#[derive(Debug, StructOpt)]
pub struct DumpOpt {
    #[structopt(parse(from_os_str))]
    file: PathBuf,
    /// Dump materials
    #[structopt(short)]
    materials: bool,
    /// Dump trimeshes
    #[structopt(short)]
    trimeshes: bool,
    /// Dump instances
    #[structopt(short)]
    instances: bool,
    /// Dump cameras
    #[structopt(short)]
    cameras: bool,
    /// Dump lights
    #[structopt(short)]
    lights: bool,
    /// Dump node hierarchy
    #[structopt(short)]
    nodes: bool,
    /// Write the parsed file back to disk
    #[structopt(short, parse(from_os_str))]
    write: Option<PathBuf>,
}

fn kind_name(kind: NodeType) -> &'static str {
    match kind {
        NodeType::AmbientColor => "Ambient",
        NodeType::MeshInstance => "Mesh",
        NodeType::Camera => "Camera",
        NodeType::CameraTarget => "Camera Target",
        NodeType::Omnilight => "Omnilight",
        NodeType::Spotlight => "Spotlight",
        NodeType::SpotlightTarget => "Spotlight Target",
    }
}

fn dump_mesh(file: &File, mesh: &Mesh) {
    println!("  {} vertices={} faces={}", mesh.name, mesh.vertices.len(), mesh.faces.len());
    println!("  matrix:");
    for row in 0..4 {
        println!(
            "    {} {} {} {}",
            mesh.matrix[0][row], mesh.matrix[1][row], mesh.matrix[2][row], mesh.matrix[3][row]
        );
    }
    println!("  vertices (x, y, z, u, v):");
    for (i, v) in mesh.vertices.iter().enumerate() {
        print!("    {:10.5} {:10.5} {:10.5}", v.x, v.y, v.z);
        if let Some(uv) = mesh.texcos.get(i) {
            print!(" {:10.5} {:10.5}", uv[0], uv[1]);
        }
        println!();
    }
    println!("  facelist:");
    for face in &mesh.faces {
        let material = face
            .material
            .and_then(|i| file.materials.get(i))
            .map_or("", |m| &m.name[..]);
        println!(
            "    {:4} {:4} {:4}  flags:{:X}  smoothing:{:X}  material:\"{}\"",
            face.index[0], face.index[1], face.index[2], face.flags, face.smoothing_group, material
        );
    }
}

fn dump_node(tree: &NodeTree, node: &Node, level: usize) {
    let indent = "  ".repeat(level);
    match &node.data {
        NodeData::MeshInstance(n) => println!(
            "{}{} [{}] ({})",
            indent,
            node.name,
            n.instance_name,
            kind_name(node.kind())
        ),
        _ => println!("{}{} ({})", indent, node.name, kind_name(node.kind())),
    }
    for child in node.children().iter().filter_map(|&c| tree.get(c)) {
        dump_node(tree, child, level + 1);
    }
}

pub fn run(opt: &DumpOpt) -> Result<()> {
    let data = fs::read(&opt.file).with_context(|| format!("failed to open {}", opt.file.display()))?;
    let mut r = Reader::new(&data);
    let file = File::read(&mut r).context("failed to parse 3ds file")?;
    if !r.warnings().is_empty() {
        info!("{} warnings while reading", r.warnings().len());
    }

    if opt.materials {
        println!("Dumping materials:");
        for material in &file.materials {
            println!("{:#?}", material);
        }
        println!();
    }
    if opt.trimeshes {
        println!("Dumping meshes:");
        for mesh in &file.meshes {
            dump_mesh(&file, mesh);
        }
        println!();
    }
    if opt.instances {
        println!("Dumping instances:");
        for i in file.nodes.preorder() {
            if let Some(node) = file.nodes.get(i) {
                if let NodeData::MeshInstance(n) = &node.data {
                    println!("  .{} : {}", node.name, n.instance_name);
                }
            }
        }
        println!();
    }
    if opt.cameras {
        println!("Dumping cameras:");
        for camera in &file.cameras {
            println!("{:#?}", camera);
        }
        println!();
    }
    if opt.lights {
        println!("Dumping lights:");
        for light in &file.lights {
            println!("{:#?}", light);
        }
        println!();
    }
    if opt.nodes {
        println!("Dumping node hierarchy:");
        for node in file.nodes.roots().iter().filter_map(|&i| file.nodes.get(i)) {
            dump_node(&file.nodes, node, 1);
        }
        println!();
    }

    if let Some(output) = &opt.write {
        file.save(output)
            .with_context(|| format!("failed to save {}", output.display()))?;
        info!("wrote {}", output.display());
    }
    Ok(())
}
