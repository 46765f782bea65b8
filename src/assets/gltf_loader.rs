//! glTF 2.0 (.gltf + .bin, or .glb) to scene graph conversion
//!
//! The default scene's node hierarchy is mirrored one to one. Every
//! triangle primitive becomes a mesh node; materials become
//! [`StandardMaterial`]s, or [`BasicMaterial`]s for `KHR_materials_unlit`.

use std::{collections::HashMap, path::Path, sync::Arc};

use cgmath::Matrix4;

use crate::gfx::{
    resources::{
        material::{BasicMaterial, Material, StandardMaterial},
        texture_resource::{ColorSpace, TextureImage},
    },
    scene::{
        mesh::{Mesh, MeshNode},
        node::{NodeKind, SceneNode, Transform},
    },
};

use super::LoadError;

/// Converts an already read glTF document into a scene fragment.
///
/// External buffers and images are resolved relative to `path`.
pub fn load_gltf(path: &Path, bytes: &[u8]) -> Result<SceneNode, LoadError> {
    let gltf_error = |source| LoadError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_error)?;
    let base = path.parent();
    let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;
    let images = gltf::import_images(&document, base, &buffers).map_err(gltf_error)?;

    let mut builder = FragmentBuilder {
        buffers: &buffers,
        images: &images,
        textures: HashMap::new(),
        mesh_count: 0,
    };

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let mut root = SceneNode::group(name);
    for node in scene.nodes() {
        root.add_child(builder.convert_node(&node));
    }

    if builder.mesh_count == 0 {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    log::debug!(
        "glTF '{}': {} nodes, {} mesh primitives, {} textures",
        path.display(),
        root.count(),
        builder.mesh_count,
        builder.textures.len()
    );
    Ok(root)
}

struct FragmentBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    // One decoded image per (image, color space) pair
    textures: HashMap<(usize, ColorSpace), Arc<TextureImage>>,
    mesh_count: usize,
}

impl FragmentBuilder<'_> {
    fn convert_node(&mut self, node: &gltf::Node) -> SceneNode {
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node_{}", node.index()));
        let transform = Transform::from_matrix(Matrix4::from(node.transform().matrix()));

        let mut meshes = node
            .mesh()
            .map(|mesh| self.convert_mesh(&mesh))
            .unwrap_or_default();

        let mut scene_node = if meshes.len() == 1 {
            let (_, mesh) = meshes.remove(0);
            SceneNode::mesh(name, mesh)
        } else {
            let mut group = SceneNode::group(name);
            for (primitive_name, mesh) in meshes {
                group.add_child(SceneNode::mesh(primitive_name, mesh));
            }
            group
        };
        scene_node.transform = transform;

        for child in node.children() {
            scene_node.add_child(self.convert_node(&child));
        }
        scene_node
    }

    fn convert_mesh(&mut self, mesh: &gltf::Mesh) -> Vec<(String, MeshNode)> {
        let mesh_name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let mut nodes = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of '{}': {:?} is not supported",
                    primitive.index(),
                    mesh_name,
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| {
                self.buffers.get(buffer.index()).map(|data| data.0.as_slice())
            });
            let Some(positions) = reader.read_positions() else {
                log::warn!("Primitive {} of '{}' has no positions", primitive.index(), mesh_name);
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|normals| normals.collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|uvs| uvs.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let geometry = Mesh::from_attributes(&positions, &normals, &uvs, indices);
            let material = self.convert_material(&primitive.material());

            self.mesh_count += 1;
            nodes.push((
                format!("{}_{}", mesh_name, primitive.index()),
                MeshNode::new(geometry, material),
            ));
        }

        nodes
    }

    fn convert_material(&mut self, material: &gltf::Material) -> Material {
        let name = material.name().unwrap_or("default").to_owned();
        let pbr = material.pbr_metallic_roughness();
        let color_map = pbr
            .base_color_texture()
            .and_then(|info| self.texture(&info.texture(), ColorSpace::Srgb));

        if material.unlit() {
            let mut basic = BasicMaterial::new(&name, pbr.base_color_factor());
            basic.texture = color_map;
            return basic.into();
        }

        let [r, g, b] = material.emissive_factor();
        let mut standard =
            StandardMaterial::new(&name, pbr.base_color_factor(), pbr.metallic_factor(), pbr.roughness_factor())
                .with_emission(r, g, b);
        standard.base_color_texture = color_map;
        standard.metallic_roughness_texture = pbr
            .metallic_roughness_texture()
            .and_then(|info| self.texture(&info.texture(), ColorSpace::Linear));
        standard.into()
    }

    fn texture(&mut self, texture: &gltf::Texture, color_space: ColorSpace) -> Option<Arc<TextureImage>> {
        let index = texture.source().index();
        if let Some(image) = self.textures.get(&(index, color_space)) {
            return Some(Arc::clone(image));
        }

        let data = self.images.get(index)?;
        let Some(pixels) = to_rgba8(data) else {
            log::warn!("Unsupported pixel format {:?} for image {}", data.format, index);
            return None;
        };
        let image = Arc::new(TextureImage::new(data.width, data.height, pixels, color_space));
        self.textures.insert((index, color_space), Arc::clone(&image));
        Some(image)
    }
}

/// Expands any 8-bit glTF image to RGBA8, 16-bit ones by their high byte
fn to_rgba8(data: &gltf::image::Data) -> Option<Vec<u8>> {
    use gltf::image::Format;

    let pixels = &data.pixels;
    let rgba = match data.format {
        Format::R8G8B8A8 => pixels.clone(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        Format::R8 => pixels.iter().flat_map(|&p| [p, p, p, 255]).collect(),
        Format::R16G16B16A16 => pixels
            .chunks_exact(8)
            .flat_map(|p| [p[1], p[3], p[5], p[7]])
            .collect(),
        Format::R16G16B16 => pixels
            .chunks_exact(6)
            .flat_map(|p| [p[1], p[3], p[5], 255])
            .collect(),
        _ => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    // A single triangle with its buffer embedded as a data URI
    fn triangle_gltf(extensions_used: &str, material: &str) -> String {
        // 3 positions (36 bytes) followed by 3 u16 indices (6 bytes) + 2 padding
        let mut bytes = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        let uri = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&bytes));

        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  {extensions_used}
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "Root", "translation": [0, 1, 0], "children": [1] }}, {{ "name": "Leaf", "mesh": 0 }}],
  "meshes": [{{ "name": "Tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}],
  "materials": [{material}],
  "buffers": [{{ "byteLength": 44, "uri": "{uri}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
        )
    }

    #[test]
    fn test_gltf_hierarchy_and_materials() {
        let json = triangle_gltf(
            "",
            r#"{ "name": "Gold", "pbrMetallicRoughness": { "baseColorFactor": [1, 0.8, 0.2, 1], "metallicFactor": 1.0, "roughnessFactor": 0.25 } }"#,
        );
        let mut root = load_gltf(Path::new("tri.gltf"), json.as_bytes()).unwrap();

        assert_eq!(root.name, "tri");
        assert_eq!(root.count(), 3);
        let root_node = &root.children[0];
        assert_eq!(root_node.name, "Root");
        assert_eq!(root_node.transform.position.y, 1.0);

        let leaf = &mut root.children[0].children[0];
        assert_eq!(leaf.name, "Leaf");
        let material = leaf.standard_mesh_mut().unwrap();
        assert_eq!(material.name, "Gold");
        assert_eq!(material.roughness, 0.25);
        assert_eq!(material.metallic, 1.0);

        let NodeKind::Mesh(mesh) = &leaf.kind else {
            panic!("leaf is not a mesh");
        };
        assert_eq!(mesh.mesh.index_count(), 3);
        // Missing normals are generated
        assert_eq!(mesh.mesh.vertices()[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unlit_material_becomes_basic() {
        let json = triangle_gltf(
            r#""extensionsUsed": ["KHR_materials_unlit"],"#,
            r#"{ "name": "Flat", "extensions": { "KHR_materials_unlit": {} } }"#,
        );
        let mut root = load_gltf(Path::new("flat.gltf"), json.as_bytes()).unwrap();
        let leaf = &mut root.children[0].children[0];
        assert!(leaf.standard_mesh_mut().is_none());
        assert!(matches!(&leaf.kind, NodeKind::Mesh(mesh) if !mesh.is_standard()));
    }

    #[test]
    fn test_invalid_document_is_gltf_error() {
        let result = load_gltf(Path::new("broken.gltf"), b"{ not json");
        assert!(matches!(result, Err(LoadError::Gltf { .. })));
    }

    #[test]
    fn test_rgb_images_are_expanded() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        assert_eq!(to_rgba8(&data), Some(vec![1, 2, 3, 255, 4, 5, 6, 255]));
    }
}
