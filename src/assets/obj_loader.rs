//! Wavefront OBJ (+ MTL) to scene graph conversion

use std::{io::BufReader, path::Path, sync::Arc};

use crate::gfx::{
    resources::{
        material::StandardMaterial,
        texture_resource::{ColorSpace, TextureImage},
    },
    scene::{
        mesh::{Mesh, MeshNode},
        node::SceneNode,
    },
};

use super::LoadError;

/// Converts an already read OBJ file, one mesh node per model.
///
/// Material libraries and textures are resolved relative to `path`.
pub fn load_obj(path: &Path, bytes: &[u8]) -> Result<SceneNode, LoadError> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let (models, materials) = tobj::load_obj_buf(
        &mut BufReader::new(bytes),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |mtl_path| tobj::load_mtl(base.join(mtl_path)),
    )
    .map_err(|source| LoadError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("No usable MTL for '{}' ({}), using defaults", path.display(), e);
        Vec::new()
    });

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let mut root = SceneNode::group(name);

    for (i, model) in models.iter().enumerate() {
        let mesh = &model.mesh;
        if mesh.indices.is_empty() {
            continue;
        }

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
        // OBJ texture space has its origin at the bottom left
        let uvs: Vec<[f32; 2]> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect();

        let geometry = Mesh::from_attributes(&positions, &normals, &uvs, mesh.indices.clone());
        let material = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|mtl| convert_material(mtl, base))
            .unwrap_or_default();

        let node_name = if model.name.is_empty() {
            format!("mesh_{}", i)
        } else {
            model.name.clone()
        };
        root.add_child(SceneNode::mesh(node_name, MeshNode::new(geometry, material.into())));
    }

    if root.children.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(root)
}

fn convert_material(mtl: &tobj::Material, base: &Path) -> StandardMaterial {
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let mut material = StandardMaterial::new(
        &mtl.name,
        [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
        0.0,
        // MTL has no roughness; derive it from the specular exponent
        1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
    );

    if let Some(texture_name) = &mtl.diffuse_texture {
        let texture_path = base.join(texture_name);
        match image::open(&texture_path) {
            Ok(image) => {
                let image = image.to_rgba8();
                let (width, height) = image.dimensions();
                material.base_color_texture = Some(Arc::new(TextureImage::new(
                    width,
                    height,
                    image.into_raw(),
                    ColorSpace::Srgb,
                )));
            }
            Err(e) => log::warn!(
                "Failed to load texture '{}': {}",
                texture_path.display(),
                e
            ),
        }
    }

    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::node::NodeKind;

    #[test]
    fn test_obj_with_mtl() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("box.mtl"),
            "newmtl red\nKd 1.0 0.0 0.0\nNs 64\n",
        )
        .unwrap();
        let obj_path = dir.path().join("box.obj");
        let obj = String::from(
            "mtllib box.mtl\no Quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nusemtl red\nf 1/1 2/2 3/3 4/4\n",
        );

        let mut root = load_obj(&obj_path, obj.as_bytes()).unwrap();
        assert_eq!(root.name, "box");
        assert_eq!(root.children.len(), 1);

        let quad = &mut root.children[0];
        assert_eq!(quad.name, "Quad");
        let material = quad.standard_mesh_mut().unwrap();
        assert_eq!(material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(material.roughness, 0.5);

        let NodeKind::Mesh(mesh) = &quad.kind else {
            panic!("quad is not a mesh");
        };
        // Quad triangulated into two triangles
        assert_eq!(mesh.mesh.index_count(), 6);
        assert_eq!(mesh.mesh.vertices()[0].uv, [0.0, 1.0]);
    }

    #[test]
    fn test_obj_without_faces_is_empty() {
        let result = load_obj(Path::new("points.obj"), b"v 0 0 0\nv 1 0 0\n");
        assert!(matches!(result, Err(LoadError::Empty(_))));
    }
}
