use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::assets::cube_texture::CubeTexture;

use super::{
    light::DirectionalLight,
    node::{NodeKind, SceneNode},
};

/// Index of a top-level node. Nodes are never removed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Root of the scene graph
#[derive(Default)]
pub struct Scene {
    children: Vec<SceneNode>,
    /// Drawn behind everything
    pub background: Option<Arc<CubeTexture>>,
    /// Image-based lighting for physically-based materials
    pub environment: Option<Arc<CubeTexture>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.children.push(node);
        NodeId(self.children.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.children.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.children.get_mut(id.0)
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Visits every node exactly once, depth-first pre-order
    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    pub fn traverse(&self, visit: &mut dyn FnMut(&SceneNode)) {
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_world_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode, Matrix4<f32>)) {
        for child in &mut self.children {
            child.traverse_world_mut(Matrix4::identity(), visit);
        }
    }

    /// First directional light in the graph
    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.children.iter().find_map(Self::find_light)
    }

    fn find_light(node: &SceneNode) -> Option<&DirectionalLight> {
        if let NodeKind::DirectionalLight(light) = &node.kind {
            return Some(light);
        }
        node.children.iter().find_map(Self::find_light)
    }

    /// Re-fits every camera helper to the light it outlines
    pub fn update_helpers(&mut self) {
        let Some(light) = self.directional_light().copied() else {
            return;
        };
        self.traverse_mut(&mut |node| {
            if let NodeKind::CameraHelper(helper) = &mut node.kind {
                helper.update(&light);
            }
        });
    }

    /// Number of nodes in the whole graph
    pub fn node_count(&self) -> usize {
        self.children.iter().map(SceneNode::count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::light::CameraHelper;
    use cgmath::Point3;

    #[test]
    fn test_add_returns_stable_ids() {
        let mut scene = Scene::new();
        let a = scene.add(SceneNode::group("a"));
        let b = scene.add(SceneNode::group("b"));
        assert_ne!(a, b);
        assert_eq!(scene.node(a).map(|n| n.name.as_str()), Some("a"));
        assert_eq!(scene.node(b).map(|n| n.name.as_str()), Some("b"));
    }

    #[test]
    fn test_traverse_visits_every_node_once() {
        let mut scene = Scene::new();
        let mut model = SceneNode::group("model");
        let mut inner = SceneNode::group("inner");
        inner.add_child(SceneNode::group("leaf"));
        model.add_child(inner);
        scene.add(model);
        scene.add(SceneNode::group("other"));

        let mut visited = Vec::new();
        scene.traverse_mut(&mut |node| visited.push(node.name.clone()));
        assert_eq!(visited, ["model", "inner", "leaf", "other"]);
        assert_eq!(scene.node_count(), 4);
    }

    #[test]
    fn test_helpers_track_light() {
        let mut scene = Scene::new();
        let light_id = scene.add(SceneNode::new(
            "light",
            NodeKind::DirectionalLight(DirectionalLight::default()),
        ));
        let helper = CameraHelper::new(&DirectionalLight::default());
        let helper_id = scene.add(SceneNode::new("helper", NodeKind::CameraHelper(helper)));

        if let Some(NodeKind::DirectionalLight(light)) =
            scene.node_mut(light_id).map(|node| &mut node.kind)
        {
            light.position = Point3::new(1.0, 2.0, 3.0);
        }
        scene.update_helpers();

        let Some(NodeKind::CameraHelper(helper)) = scene.node(helper_id).map(|node| &node.kind)
        else {
            panic!("helper node missing");
        };
        assert_eq!(helper.lines()[24].position, [1.0, 2.0, 3.0]);
    }
}
