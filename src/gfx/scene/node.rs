//! Scene graph nodes
//!
//! A node owns its children, so a loaded model is a self-contained subtree
//! that can be built on a worker thread and handed to the scene in one
//! piece.

use cgmath::*;

use crate::gfx::resources::material::StandardMaterial;

use super::{
    light::{CameraHelper, DirectionalLight},
    mesh::MeshNode,
};

/// Position, Euler XYZ rotation (radians) and scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Local matrix: translate * Rx * Ry * Rz * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Builds a transform from a column-major matrix without shear
    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        let position = matrix.w.truncate();
        let scale = Vector3::new(
            matrix.x.truncate().magnitude(),
            matrix.y.truncate().magnitude(),
            matrix.z.truncate().magnitude(),
        );
        if scale.x == 0.0 || scale.y == 0.0 || scale.z == 0.0 {
            return Self {
                position,
                rotation: Vector3::zero(),
                scale,
            };
        }

        let r = Matrix3::from_cols(
            matrix.x.truncate() / scale.x,
            matrix.y.truncate() / scale.y,
            matrix.z.truncate() / scale.z,
        );
        // Row-major element names: m13 is row 1, column 3
        let (m11, m12, m13) = (r.x.x, r.y.x, r.z.x);
        let (m22, m23) = (r.y.y, r.z.y);
        let (m32, m33) = (r.y.z, r.z.z);

        let y = m13.clamp(-1.0, 1.0).asin();
        let (x, z) = if m13.abs() < 0.9999999 {
            ((-m23).atan2(m33), (-m12).atan2(m11))
        } else {
            (m32.atan2(m22), 0.0)
        };

        Self {
            position,
            rotation: Vector3::new(x, y, z),
            scale,
        }
    }
}

/// What a node is, beyond its place in the hierarchy
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    DirectionalLight(DirectionalLight),
    CameraHelper(CameraHelper),
}

pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshNode) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// The node's physically-based material, if it is a mesh that has one
    pub fn standard_mesh_mut(&mut self) -> Option<&mut StandardMaterial> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => mesh.material.as_standard_mut(),
            _ => None,
        }
    }

    /// Depth-first pre-order visit of this node and all descendants
    pub fn traverse(&self, visit: &mut dyn FnMut(&SceneNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// Like [`traverse_mut`](Self::traverse_mut), also passing each node's
    /// world matrix
    pub fn traverse_world_mut(
        &mut self,
        parent: Matrix4<f32>,
        visit: &mut dyn FnMut(&mut SceneNode, Matrix4<f32>),
    ) {
        let world = parent * self.transform.matrix();
        visit(self, world);
        for child in &mut self.children {
            child.traverse_world_mut(world, visit);
        }
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of nodes in this subtree, itself included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Transform as _;
    use crate::gfx::{
        resources::material::{BasicMaterial, StandardMaterial},
        scene::mesh::Mesh,
    };

    fn triangle() -> Mesh {
        Mesh::from_attributes(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[],
            &[],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_standard_mesh_capability() {
        let mut standard = SceneNode::mesh(
            "lit",
            MeshNode::new(triangle(), StandardMaterial::default().into()),
        );
        let mut basic = SceneNode::mesh(
            "unlit",
            MeshNode::new(triangle(), BasicMaterial::new("unlit", [1.0; 4]).into()),
        );
        let mut group = SceneNode::group("group");

        assert!(standard.standard_mesh_mut().is_some());
        assert!(basic.standard_mesh_mut().is_none());
        assert!(group.standard_mesh_mut().is_none());
    }

    #[test]
    fn test_traverse_visits_nested_nodes_once_in_pre_order() {
        let mut root = SceneNode::group("root");
        let mut a = SceneNode::group("a");
        a.add_child(SceneNode::group("a1"));
        a.add_child(SceneNode::group("a2"));
        root.add_child(a);
        root.add_child(SceneNode::group("b"));

        let mut order = Vec::new();
        root.traverse_mut(&mut |node| order.push(node.name.clone()));
        assert_eq!(order, ["root", "a", "a1", "a2", "b"]);
        assert_eq!(root.count(), 5);
        assert!(root.find("a2").is_some());
    }

    #[test]
    fn test_world_matrices_compose() {
        let mut parent = SceneNode::group("parent");
        parent.transform.scale = Vector3::new(10.0, 10.0, 10.0);
        parent.transform.position = Vector3::new(0.0, -4.0, 0.0);
        let mut child = SceneNode::group("child");
        child.transform.position = Vector3::new(0.0, 1.0, 0.0);
        parent.add_child(child);

        let mut worlds = Vec::new();
        parent.traverse_world_mut(Matrix4::identity(), &mut |_, world| worlds.push(world));
        let origin = worlds[1].transform_point(Point3::origin());
        assert!((origin.y - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_matrix_round_trip() {
        let transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::new(0.3, -0.7, 1.1),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let recovered = Transform::from_matrix(transform.matrix());
        assert!((recovered.position - transform.position).magnitude() < 1e-5);
        assert!((recovered.rotation - transform.rotation).magnitude() < 1e-4);
        assert!((recovered.scale - transform.scale).magnitude() < 1e-4);
    }
}
