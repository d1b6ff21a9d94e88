/// Scenegraph: a DAG of transform, surface and shape nodes
///
/// Nodes live in an arena owned by `SceneGraph` and are addressed by
/// `NodeId` handles. Every node except a group has at most one child; groups
/// hold an ordered list. A node may be the child of several parents, in which
/// case traversal visits it once per path from the root.
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};

use crate::error::{RenderError, RenderResult};
use crate::geometry::{Color, Mesh};
use crate::transform::{Angles, Axis, Transform};

/// Handle to a node inside a `SceneGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The semantic parameters a transform node was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformKind {
    Translate(Vector3<f64>),
    Rotate(Angles),
    Scale(Vector3<f64>),
    Shear {
        shear_axis: Axis,
        contrib_axis: Axis,
        factor: f64,
    },
    Matrix(Matrix4<f64>),
}

impl TransformKind {
    pub fn matrix(&self) -> Matrix4<f64> {
        match self {
            TransformKind::Translate(v) => Transform::translate(v),
            TransformKind::Rotate(angles) => Transform::rotate(angles),
            TransformKind::Scale(factors) => Transform::scale(factors),
            TransformKind::Shear {
                shear_axis,
                contrib_axis,
                factor,
            } => Transform::shear(*shear_axis, *contrib_axis, *factor),
            TransformKind::Matrix(m) => *m,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Entry point for traversal; can never be a child.
    Root,
    /// The only kind allowed more than one child.
    Group,
    /// A named node with an identity transform.
    Plain,
    Transform(TransformKind),
    Surface(Color),
    Shape(Arc<Mesh>),
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    kind: NodeKind,
    local: Matrix4<f64>,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
}

impl Node {
    fn new(name: &str, kind: NodeKind) -> Self {
        let local = match &kind {
            NodeKind::Transform(t) => t.matrix(),
            _ => Matrix4::identity(),
        };
        Self {
            name: name.to_string(),
            kind,
            local,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn local_transform(&self) -> &Matrix4<f64> {
        &self.local
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Back-references, for lookup only; traversal never follows them.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    pub fn surface(&self) -> Option<Color> {
        match self.kind {
            NodeKind::Surface(color) => Some(color),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        match &self.kind {
            NodeKind::Shape(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Root => "RootNode",
            NodeKind::Group => "GroupNode",
            NodeKind::Plain => "Node",
            NodeKind::Transform(TransformKind::Translate(_)) => "TranslateNode",
            NodeKind::Transform(TransformKind::Rotate(_)) => "RotateNode",
            NodeKind::Transform(TransformKind::Scale(_)) => "ScaleNode",
            NodeKind::Transform(TransformKind::Shear { .. }) => "ShearNode",
            NodeKind::Transform(TransformKind::Matrix(_)) => "TransformNode",
            NodeKind::Surface(_) => "SurfaceNode",
            NodeKind::Shape(_) => "ShapeNode",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.kind_name())
        } else {
            write!(f, "{} '{}'", self.kind_name(), self.name)
        }
    }
}

/// One placement of a shape in world space.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Product of every transform on the path from the traversal start.
    pub transform: Matrix4<f64>,
    pub shape: NodeId,
    pub mesh: Arc<Mesh>,
    /// Color of the nearest surface node above the shape, if any.
    pub surface: Option<Color>,
}

impl Instance {
    pub fn color(&self) -> Color {
        self.surface.unwrap_or(Color::DEFAULT_SURFACE)
    }
}

/// Arena that owns every node of a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add(&mut self, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, kind));
        id
    }

    pub fn add_root(&mut self, name: &str) -> NodeId {
        self.add(name, NodeKind::Root)
    }

    pub fn add_group(&mut self, name: &str) -> NodeId {
        self.add(name, NodeKind::Group)
    }

    pub fn add_node(&mut self, name: &str) -> NodeId {
        self.add(name, NodeKind::Plain)
    }

    pub fn add_transform(&mut self, kind: TransformKind, name: &str) -> NodeId {
        self.add(name, NodeKind::Transform(kind))
    }

    pub fn add_translate(&mut self, v: Vector3<f64>, name: &str) -> NodeId {
        self.add_transform(TransformKind::Translate(v), name)
    }

    pub fn add_rotate(&mut self, angles: Angles, name: &str) -> NodeId {
        self.add_transform(TransformKind::Rotate(angles), name)
    }

    pub fn add_scale(&mut self, factors: Vector3<f64>, name: &str) -> NodeId {
        self.add_transform(TransformKind::Scale(factors), name)
    }

    pub fn add_shear(&mut self, shear_axis: Axis, contrib_axis: Axis, factor: f64, name: &str) -> NodeId {
        self.add_transform(
            TransformKind::Shear {
                shear_axis,
                contrib_axis,
                factor,
            },
            name,
        )
    }

    pub fn add_surface(&mut self, color: Color, name: &str) -> NodeId {
        self.add(name, NodeKind::Surface(color))
    }

    pub fn add_shape(&mut self, mesh: Arc<Mesh>, name: &str) -> NodeId {
        self.add(name, NodeKind::Shape(mesh))
    }

    pub fn node(&self, id: NodeId) -> RenderResult<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| RenderError::Structure(format!("no node with handle {}", id.0)))
    }

    /// Attach `child` below `parent`.
    ///
    /// Fails with `Structure` when `parent` is not a group and already has a
    /// child, when `child` is a root, or when the edge would close a cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> RenderResult<()> {
        let p = self.node(parent)?;
        let c = self.node(child)?;

        if c.is_root() {
            return Err(RenderError::Structure(format!(
                "{} cannot be attached below {}",
                c, p
            )));
        }
        if !p.is_group() {
            if let Some(&existing) = p.children.first() {
                return Err(RenderError::Structure(format!(
                    "this node ({}) already has a child ({}); use a group for {}",
                    p, self.nodes[existing.0], c
                )));
            }
        }
        if parent == child || self.reaches(child, parent) {
            return Err(RenderError::Structure(format!(
                "attaching {} below {} would create a cycle",
                c, p
            )));
        }

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
        Ok(())
    }

    /// Whether `to` can be reached from `from` by following child edges.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if seen.insert(id) {
                stack.extend_from_slice(&self.nodes[id.0].children);
            }
        }
        false
    }

    /// Collect one instance per path from `root` to every shape below it.
    pub fn composite_transforms(&self, root: NodeId) -> RenderResult<Vec<Instance>> {
        let node = self.node(root)?;
        if !node.is_root() {
            return Err(RenderError::Structure(format!(
                "traversal must start at a root, not {}",
                node
            )));
        }
        self.traverse(root, &Matrix4::identity(), None)
    }

    /// Traverse from any node given the transform and surface accumulated above it.
    ///
    /// Instances come out in depth-first child order, so repeated traversals
    /// of the same graph produce identical lists.
    pub fn traverse(
        &self,
        node: NodeId,
        accumulated: &Matrix4<f64>,
        surface: Option<Color>,
    ) -> RenderResult<Vec<Instance>> {
        self.node(node)?;
        let mut instances = Vec::new();
        self.traverse_into(node, accumulated, surface, &mut instances);
        debug!("traversal from node {} produced {} instances", node.0, instances.len());
        Ok(instances)
    }

    fn traverse_into(
        &self,
        id: NodeId,
        accumulated: &Matrix4<f64>,
        surface: Option<Color>,
        out: &mut Vec<Instance>,
    ) {
        let node = &self.nodes[id.0];
        let surface = node.surface().or(surface);
        let composite = accumulated * node.local;

        if let Some(mesh) = node.mesh() {
            if surface.is_none() {
                warn!("{} has no surface above it; using the default color", node);
            }
            out.push(Instance {
                transform: composite,
                shape: id,
                mesh: Arc::clone(mesh),
                surface,
            });
        }

        for &child in &node.children {
            self.traverse_into(child, &composite, surface, out);
        }
    }

    /// Render the subtree below `id` as an ASCII tree.
    ///
    /// Shared nodes appear once per path.
    pub fn print_tree(&self, id: NodeId) -> RenderResult<String> {
        self.node(id)?;
        let mut lines = Vec::new();
        self.print_into(id, "", &mut lines);
        Ok(lines.join("\n"))
    }

    fn print_into(&self, id: NodeId, prefix: &str, lines: &mut Vec<String>) {
        let node = &self.nodes[id.0];
        if prefix.is_empty() {
            lines.push(node.to_string());
        } else {
            let head = &prefix[..prefix.len().saturating_sub(3)];
            lines.push(format!("{}+- {}", head, node));
        }

        let n = node.children.len();
        if n == 0 {
            lines.push(prefix.trim_end().to_string());
        } else {
            lines.push(format!("{} |", prefix));
        }

        for (i, &child) in node.children.iter().enumerate() {
            let branch = if i + 1 < n { " |  " } else { "    " };
            self.print_into(child, &format!("{}{}", prefix, branch), lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use nalgebra::Vector4;

    fn red() -> Color {
        Color::new(1.0, 0.0, 0.0).unwrap()
    }

    fn blue() -> Color {
        Color::new(0.0, 0.0, 1.0).unwrap()
    }

    fn cube() -> Arc<Mesh> {
        Arc::new(shapes::cube(2.0).unwrap())
    }

    #[test]
    fn test_second_child_fails_on_plain_nodes() {
        let mut sg = SceneGraph::new();
        let parents = [
            sg.add_root("r"),
            sg.add_node("n"),
            sg.add_translate(Vector3::new(1.0, 0.0, 0.0), "t"),
            sg.add_rotate(Angles::zero(), "rot"),
            sg.add_scale(Vector3::new(1.0, 1.0, 1.0), "s"),
            sg.add_shear(Axis::X, Axis::Y, 1.0, "sh"),
            sg.add_surface(red(), "surf"),
            sg.add_shape(cube(), "shape"),
        ];
        for parent in parents {
            let a = sg.add_node("a");
            let b = sg.add_node("b");
            sg.add_child(parent, a).unwrap();
            assert!(matches!(sg.add_child(parent, b), Err(RenderError::Structure(_))));
            assert_eq!(sg.node(parent).unwrap().children(), &[a]);
            assert!(sg.node(b).unwrap().parents().is_empty());
        }
    }

    #[test]
    fn test_group_takes_many_children() {
        let mut sg = SceneGraph::new();
        let g = sg.add_group("g");
        let kids: Vec<NodeId> = (0..4).map(|i| sg.add_node(&format!("k{}", i))).collect();
        for &k in &kids {
            sg.add_child(g, k).unwrap();
        }
        assert_eq!(sg.node(g).unwrap().children(), kids.as_slice());
        assert_eq!(sg.node(kids[2]).unwrap().parents(), &[g]);
    }

    #[test]
    fn test_root_cannot_be_a_child() {
        let mut sg = SceneGraph::new();
        let g = sg.add_group("g");
        let r = sg.add_root("r");
        assert!(matches!(sg.add_child(g, r), Err(RenderError::Structure(_))));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut sg = SceneGraph::new();
        let g = sg.add_group("g");
        let t = sg.add_translate(Vector3::new(0.0, 1.0, 0.0), "t");
        sg.add_child(g, t).unwrap();
        assert!(matches!(sg.add_child(t, g), Err(RenderError::Structure(_))));
        assert!(matches!(sg.add_child(g, g), Err(RenderError::Structure(_))));
    }

    #[test]
    fn test_cycle_check_on_stacked_diamonds() {
        // Each level fans out to two nodes that share the next level,
        // giving 2^40 paths from the top to the bottom
        let mut sg = SceneGraph::new();
        let top = sg.add_group("a0");
        let mut level = top;
        for i in 1..=40 {
            let next = sg.add_group(&format!("a{}", i));
            for side in ["b", "c"] {
                let n = sg.add_node(&format!("{}{}", side, i));
                sg.add_child(level, n).unwrap();
                sg.add_child(n, next).unwrap();
            }
            level = next;
        }
        assert!(matches!(sg.add_child(level, top), Err(RenderError::Structure(_))));
        let leaf = sg.add_group("leaf");
        sg.add_child(level, leaf).unwrap();
    }

    #[test]
    fn test_unknown_handle() {
        let mut sg = SceneGraph::new();
        let g = sg.add_group("g");
        assert!(sg.add_child(g, NodeId(42)).is_err());
        assert!(sg.composite_transforms(NodeId(42)).is_err());
    }

    #[test]
    fn test_traversal_must_start_at_root() {
        let mut sg = SceneGraph::new();
        let g = sg.add_group("g");
        assert!(matches!(sg.composite_transforms(g), Err(RenderError::Structure(_))));
        assert!(sg.traverse(g, &Matrix4::identity(), None).unwrap().is_empty());
    }

    #[test]
    fn test_transforms_compose_top_down() {
        let mut sg = SceneGraph::new();
        let root = sg.add_root("");
        let t = sg.add_translate(Vector3::new(1.0, 0.0, 0.0), "t");
        let s = sg.add_scale(Vector3::new(2.0, 2.0, 2.0), "s");
        let shape = sg.add_shape(cube(), "c");
        sg.add_child(root, t).unwrap();
        sg.add_child(t, s).unwrap();
        sg.add_child(s, shape).unwrap();

        let instances = sg.composite_transforms(root).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].shape, shape);
        // Scale applies first, then the translation above it
        let p = instances[0].transform * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vector4::new(3.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_shared_node_is_instanced_per_path_with_nearest_surface() {
        let mut sg = SceneGraph::new();
        let root = sg.add_root("");
        let outer = sg.add_surface(red(), "outer");
        let g = sg.add_group("g");
        let left = sg.add_translate(Vector3::new(-1.0, 0.0, 0.0), "left");
        let right = sg.add_translate(Vector3::new(1.0, 0.0, 0.0), "right");
        let inner = sg.add_surface(blue(), "inner");
        let shared = sg.add_scale(Vector3::new(0.5, 0.5, 0.5), "shared");
        let shape = sg.add_shape(cube(), "c");

        sg.add_child(root, outer).unwrap();
        sg.add_child(outer, g).unwrap();
        sg.add_child(g, left).unwrap();
        sg.add_child(g, right).unwrap();
        sg.add_child(left, shared).unwrap();
        sg.add_child(right, inner).unwrap();
        sg.add_child(inner, shared).unwrap();
        sg.add_child(shared, shape).unwrap();

        assert_eq!(sg.node(shared).unwrap().parents(), &[left, inner]);

        let instances = sg.composite_transforms(root).unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].surface, Some(red()));
        assert_eq!(instances[1].surface, Some(blue()));
        assert_eq!(instances[0].transform[(0, 3)], -1.0);
        assert_eq!(instances[1].transform[(0, 3)], 1.0);
        assert!(Arc::ptr_eq(&instances[0].mesh, &instances[1].mesh));
    }

    #[test]
    fn test_traversal_is_repeatable() {
        let mut sg = SceneGraph::new();
        let root = sg.add_root("");
        let g = sg.add_group("g");
        sg.add_child(root, g).unwrap();
        for i in 0..5 {
            let r = sg.add_rotate(Angles::new(0.3 * i as f64, 0.1, -0.2), "r");
            let c = sg.add_shape(cube(), "c");
            sg.add_child(g, r).unwrap();
            sg.add_child(r, c).unwrap();
        }

        let first = sg.composite_transforms(root).unwrap();
        let second = sg.composite_transforms(root).unwrap();
        assert_eq!(first.len(), 5);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.transform, b.transform);
            assert_eq!(a.shape, b.shape);
            assert_eq!(a.surface, b.surface);
        }
    }

    #[test]
    fn test_shape_without_surface_uses_default_color() {
        let mut sg = SceneGraph::new();
        let root = sg.add_root("");
        let c = sg.add_shape(cube(), "c");
        sg.add_child(root, c).unwrap();
        let instances = sg.composite_transforms(root).unwrap();
        assert_eq!(instances[0].surface, None);
        assert_eq!(instances[0].color(), Color::DEFAULT_SURFACE);
    }

    #[test]
    fn test_print_tree() {
        let mut sg = SceneGraph::new();
        let root = sg.add_root("");
        let g = sg.add_group("g");
        let a = sg.add_shape(cube(), "a");
        let b = sg.add_node("b");
        sg.add_child(root, g).unwrap();
        sg.add_child(g, a).unwrap();
        sg.add_child(g, b).unwrap();

        let tree = sg.print_tree(root).unwrap();
        let expected = [
            "RootNode",
            " |",
            " +- GroupNode 'g'",
            "     |",
            "     +- ShapeNode 'a'",
            "     |",
            "     +- Node 'b'",
            "",
        ];
        assert_eq!(tree.split('\n').collect::<Vec<_>>(), expected);
    }
}
