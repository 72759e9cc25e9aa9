use crate::geometry::Geometry;
use crate::material::MaterialHandle;
use crate::particles::ParticleField;
use glam::Mat4;
use hologram_common::{NodeId, Transform};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
}

/// Triangle mesh drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: MaterialHandle,
}

/// Point cloud drawn with one points material.
#[derive(Debug, Clone, PartialEq)]
pub struct Points {
    pub field: ParticleField,
    pub material: MaterialHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    Points(Points),
}

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: MaterialHandle) -> Self {
        Self::new(name, NodeKind::Mesh(Mesh { geometry, material }))
    }

    pub fn points(name: impl Into<String>, field: ParticleField, material: MaterialHandle) -> Self {
        Self::new(name, NodeKind::Points(Points { field, material }))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&Points> {
        match &self.kind {
            NodeKind::Points(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_points_mut(&mut self) -> Option<&mut Points> {
        match &mut self.kind {
            NodeKind::Points(p) => Some(p),
            _ => None,
        }
    }
}

/// The scene graph.
///
/// Nodes live in one map keyed by id. A node is part of the rendered scene
/// once it, or one of its ancestors, is attached to the root. Inserted but
/// unattached subtrees are kept aside until attached, which lets a loader
/// assemble a model before making it visible.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the nodes attached directly to the root, in attach order.
    pub fn root_children(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Store a node without attaching it anywhere.
    pub fn insert(&mut self, mut node: Node) -> NodeId {
        let id = NodeId::new();
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        id
    }

    /// Store a node and attach it to the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.insert(node);
        self.roots.push(id);
        tracing::debug!(node = %id.short(), "node added to root");
        id
    }

    /// Store a node as a child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = self.insert(node);
        self.link(parent, id);
        Ok(id)
    }

    /// Attach an existing node to the root. Attaching a node that is already
    /// a root child is a no-op; a node with a parent is moved.
    pub fn attach_to_root(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::NodeNotFound(id));
        }
        if self.roots.contains(&id) {
            return Ok(());
        }
        self.unlink(id);
        self.roots.push(id);
        tracing::debug!(node = %id.short(), "node attached to root");
        Ok(())
    }

    /// True when the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.roots.contains(&c) {
                return true;
            }
            current = self.nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    /// The node and all of its descendants, depth-first, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Visit every mesh in the subtree rooted at `id`.
    pub fn for_each_mesh_mut(&mut self, id: NodeId, mut f: impl FnMut(NodeId, &mut Mesh)) {
        for node_id in self.subtree(id) {
            if let Some(Node {
                kind: NodeKind::Mesh(mesh),
                ..
            }) = self.nodes.get_mut(&node_id)
            {
                f(node_id, mesh);
            }
        }
    }

    /// Visit every attached node with its world matrix, parents before children.
    pub fn walk(&self, mut f: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().rev().map(|id| (*id, Mat4::IDENTITY)).collect();
        while let Some((id, parent_matrix)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let world = parent_matrix * node.transform.matrix();
            f(id, node, world);
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
    }

    /// World matrix of a node, following its parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let parent = self.nodes.get_mut(&child).and_then(|c| c.parent.take());
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != child);
        }
    }
}
