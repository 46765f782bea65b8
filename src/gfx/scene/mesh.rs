use std::ops::Range;

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::{util::DeviceExt, Device};

use crate::{
    gfx::resources::material::Material,
    wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

use super::vertex::Vertex3D;

/// GPU vertex and index buffers for a [`Mesh`]
pub struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

/// Indexed triangle geometry
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            buffers: None,
        }
    }

    /// Builds a mesh from separate attribute streams.
    ///
    /// Missing normals are computed from the triangles and missing UVs are
    /// filled with zeros.
    pub fn from_attributes(
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
        indices: Vec<u32>,
    ) -> Self {
        let computed;
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            computed = Self::calculate_vertex_normals(positions, &indices);
            &computed
        };

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: normals[i],
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        Self::new(vertices, indices)
    }

    /// Area-weighted smooth normals, used when a model ships without them
    pub fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }

            let (v0, v1, v2) = (positions[i0], positions[i1], positions[i2]);
            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for vertex_idx in [i0, i1, i2] {
                for axis in 0..3 {
                    normals[vertex_idx][axis] += face_normal[axis];
                }
            }
        }

        for normal in &mut normals {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|c| *c /= length);
            } else {
                *normal = [0.0, 1.0, 0.0];
            }
        }

        normals
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Creates the vertex and index buffers if they do not exist yet
    pub fn init_gpu_resources(&mut self, device: &Device) {
        if self.buffers.is_some() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.buffers = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
        });
    }
}

/// Per-mesh uniform, matches `ModelUniform` in the shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    /// Non-zero when the light's shadow darkens this mesh
    pub receive_shadow: u32,
    _padding: [u32; 3],
}

impl ModelUniform {
    pub fn from_world(world: Matrix4<f32>, receive_shadow: bool) -> Self {
        let normal_matrix = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: world.into(),
            normal_matrix: normal_matrix.into(),
            receive_shadow: u32::from(receive_shadow),
            _padding: [0; 3],
        }
    }
}

/// GPU-side transform state of a mesh node
pub struct ModelBinding {
    ubo: UniformBuffer<ModelUniform>,
    bind_group: wgpu::BindGroup,
}

impl ModelBinding {
    pub fn new(
        device: &Device,
        layout: &BindGroupLayoutWithDesc,
        world: Matrix4<f32>,
        receive_shadow: bool,
    ) -> Self {
        let ubo =
            UniformBuffer::new_with_data(device, &ModelUniform::from_world(world, receive_shadow));
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, "Model Bind Group");
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, world: Matrix4<f32>, receive_shadow: bool) {
        self.ubo
            .update_content(queue, ModelUniform::from_world(world, receive_shadow));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// A renderable mesh: geometry plus the material it is shaded with
pub struct MeshNode {
    pub mesh: Mesh,
    pub material: Material,
    pub(crate) model_binding: Option<ModelBinding>,
}

impl MeshNode {
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            mesh,
            material,
            model_binding: None,
        }
    }

    /// Whether the mesh is shaded with the physically-based material model
    pub fn is_standard(&self) -> bool {
        matches!(self.material, Material::Standard(_))
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>) {
        // Skip drawing if not uploaded
        let Some(buffers) = &mesh.buffers else {
            return;
        };

        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count(), 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_normals_are_computed() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mesh = Mesh::from_attributes(&positions, &[], &[], vec![0, 1, 2]);

        assert_eq!(mesh.vertices().len(), 3);
        for vertex in mesh.vertices() {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
            assert_eq!(vertex.uv, [0.0, 0.0]);
        }
        assert_eq!(mesh.index_count(), 3);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let normals = Mesh::calculate_vertex_normals(&positions, &[0, 1, 7]);
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]; 2]);
    }

    #[test]
    fn test_model_uniform_carries_receive_shadow() {
        use cgmath::Vector3;

        let world = Matrix4::from_translation(Vector3::new(0.0, -4.0, 0.0));
        let receiving = ModelUniform::from_world(world, true);
        let ignoring = ModelUniform::from_world(world, false);

        assert_eq!(receiving.receive_shadow, 1);
        assert_eq!(ignoring.receive_shadow, 0);
        assert_eq!(receiving.model[3], [0.0, -4.0, 0.0, 1.0]);
        // Two matrices plus a 16-byte tail, as laid out in WGSL
        assert_eq!(std::mem::size_of::<ModelUniform>(), 144);
    }
}
