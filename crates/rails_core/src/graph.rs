//! Shared scene graph.
//!
//! One graph lives in [`ProcessState`](crate::state::ProcessState) for the whole
//! process. Its stage node is the root every scene attaches its own root node to.
//! Nodes are addressed by [`NodeId`]; ids are never reused, so a stale id held by
//! a repaint callback simply stops resolving once its node is destroyed.
//!
//! The graph does not enforce who may mutate it. Only the scene that is
//! currently transitioning or running is expected to add or remove stage
//! children.

use glam::Vec2;
use std::collections::HashMap;

use crate::layout::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Groups children; draws nothing itself.
    Container,
    /// Solid rectangle. Fade overlays and backdrops are fills.
    Fill { color: [f32; 4] },
    Label { text: String },
    /// Image backed by a resource URL. `loaded` flips once the resource
    /// cache has produced the texture.
    Image { url: String, loaded: bool },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub visible: bool,
    pub alpha: f32,
    pub position: Vec2,
    pub size: Vec2,
    /// Normalised pivot for `position`: (0, 0) is top-left, (0.5, 0.5) centre.
    pub anchor: Vec2,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            visible: true,
            alpha: 1.0,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            anchor: Vec2::ZERO,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Top-left corner after applying the anchor.
    pub fn top_left(&self) -> Vec2 {
        self.position - self.anchor * self.size
    }

    fn covers(&self, viewport: Viewport) -> bool {
        let min = self.top_left();
        let max = min + self.size;
        let view = viewport.size();
        min.x <= 0.0 && min.y <= 0.0 && max.x >= view.x && max.y >= view.y
    }
}

pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    stage: NodeId,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        let stage = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(stage, Node::new(NodeKind::Container));
        Self {
            nodes,
            stage,
            next_id: 1,
        }
    }

    pub fn stage(&self) -> NodeId {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Create a detached node.
    pub fn spawn(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        id
    }

    /// Append `child` as the topmost child of `parent`, moving it out of any
    /// previous parent. Returns false if either node is missing or the move
    /// would create a cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == self.stage
            || !self.contains(parent)
            || !self.contains(child)
            || self.is_ancestor(child, parent)
        {
            log::warn!("Refusing to attach {child} under {parent}");
            return false;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        true
    }

    /// Remove `child` from `parent` only if it is actually parented there.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let is_child = self
            .nodes
            .get(&child)
            .is_some_and(|node| node.parent == Some(parent));
        if is_child {
            self.detach(child);
        }
        is_child
    }

    /// Unlink a node from its parent. The node and its subtree stay alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|&c| c != id);
        }
    }

    /// Detach a node and free it together with its whole subtree.
    /// The stage itself cannot be destroyed.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        if id == self.stage {
            return 0;
        }
        self.detach(id);
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// The node's own visibility flag. Missing nodes are invisible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.visible)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// True when the node and every ancestor up to the stage are visible,
    /// i.e. the node would appear in the next rendered frame.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(&node_id) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            if node_id == self.stage {
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(node_id) = current {
            if node_id == candidate {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|node| node.parent);
        }
        false
    }

    /// Depth-first walk over rendered nodes in paint order (parents before
    /// children, earlier siblings first). The callback receives the node's
    /// accumulated opacity.
    pub fn visit_rendered(&self, mut f: impl FnMut(NodeId, &Node, f32)) {
        let mut stack = vec![(self.stage, 1.0_f32)];
        while let Some((id, parent_alpha)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let alpha = parent_alpha * node.alpha;
            f(id, node, alpha);
            for &child in node.children.iter().rev() {
                stack.push((child, alpha));
            }
        }
    }

    /// Blend every rendered fill that covers the whole viewport over `base`,
    /// in paint order. This is the colour a renderer that only clears the
    /// screen should present.
    pub fn composite_backdrop(&self, base: [f32; 4], viewport: Viewport) -> [f32; 4] {
        let mut out = base;
        self.visit_rendered(|_, node, alpha| {
            let NodeKind::Fill { color } = node.kind else {
                return;
            };
            if !node.covers(viewport) {
                return;
            }
            let a = (color[3] * alpha).clamp(0.0, 1.0);
            for (channel, value) in out.iter_mut().zip(color).take(3) {
                *channel = value * a + *channel * (1.0 - a);
            }
        });
        out
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(graph: &mut SceneGraph, color: [f32; 4], viewport: Viewport) -> NodeId {
        let id = graph.spawn(NodeKind::Fill { color });
        graph.get_mut(id).expect("just spawned").size = viewport.size();
        id
    }

    #[test]
    fn add_child_moves_node_between_parents() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(NodeKind::Container);
        let b = graph.spawn(NodeKind::Container);
        let child = graph.spawn(NodeKind::Container);

        assert!(graph.add_child(a, child));
        assert!(graph.add_child(b, child));
        assert!(graph.get(a).expect("a").children().is_empty());
        assert_eq!(graph.get(b).expect("b").children(), &[child]);
        assert_eq!(graph.get(child).expect("child").parent(), Some(b));
    }

    #[test]
    fn add_child_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(NodeKind::Container);
        let b = graph.spawn(NodeKind::Container);
        assert!(graph.add_child(a, b));
        assert!(!graph.add_child(b, a));
        assert!(!graph.add_child(a, a));
    }

    #[test]
    fn remove_child_requires_matching_parent() {
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let other = graph.spawn(NodeKind::Container);
        let child = graph.spawn(NodeKind::Container);
        graph.add_child(stage, child);

        assert!(!graph.remove_child(other, child));
        assert!(graph.remove_child(stage, child));
        assert!(graph.get(child).expect("still alive").parent().is_none());
    }

    #[test]
    fn destroy_frees_whole_subtree() {
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let root = graph.spawn(NodeKind::Container);
        let a = graph.spawn(NodeKind::Container);
        let b = graph.spawn(NodeKind::Label {
            text: "hi".to_string(),
        });
        graph.add_child(stage, root);
        graph.add_child(root, a);
        graph.add_child(a, b);

        assert_eq!(graph.destroy(root), 3);
        assert_eq!(graph.len(), 1);
        assert!(graph.get(stage).expect("stage").children().is_empty());
        assert_eq!(graph.destroy(stage), 0);
    }

    #[test]
    fn is_rendered_requires_visible_chain_to_stage() {
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let root = graph.spawn(NodeKind::Container);
        let leaf = graph.spawn(NodeKind::Container);
        graph.add_child(root, leaf);

        // Detached from the stage.
        assert!(!graph.is_rendered(leaf));

        graph.add_child(stage, root);
        assert!(graph.is_rendered(leaf));

        graph.set_visible(root, false);
        assert!(graph.is_visible(leaf));
        assert!(!graph.is_rendered(leaf));
    }

    #[test]
    fn visit_rendered_skips_hidden_subtrees_and_multiplies_alpha() {
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let root = graph.spawn(NodeKind::Container);
        let hidden = graph.spawn(NodeKind::Container);
        let leaf = graph.spawn(NodeKind::Container);
        graph.add_child(stage, root);
        graph.add_child(root, hidden);
        graph.add_child(root, leaf);
        graph.get_mut(root).expect("root").alpha = 0.5;
        graph.get_mut(leaf).expect("leaf").alpha = 0.5;
        graph.set_visible(hidden, false);

        let mut seen = Vec::new();
        graph.visit_rendered(|id, _, alpha| seen.push((id, alpha)));
        assert_eq!(seen, vec![(stage, 1.0), (root, 0.5), (leaf, 0.25)]);
    }

    #[test]
    fn composite_backdrop_blends_covering_fills_in_order() {
        let viewport = Viewport::new(100, 100);
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let red = fill(&mut graph, [1.0, 0.0, 0.0, 1.0], viewport);
        let black = fill(&mut graph, [0.0, 0.0, 0.0, 1.0], viewport);
        graph.add_child(stage, red);
        graph.add_child(stage, black);
        graph.get_mut(black).expect("overlay").alpha = 0.25;

        let out = graph.composite_backdrop([0.0, 0.0, 0.0, 1.0], viewport);
        assert!((out[0] - 0.75).abs() < 1e-5);
        assert!(out[1].abs() < 1e-5);
    }

    #[test]
    fn composite_backdrop_ignores_partial_fills() {
        let viewport = Viewport::new(100, 100);
        let mut graph = SceneGraph::new();
        let stage = graph.stage();
        let small = graph.spawn(NodeKind::Fill {
            color: [1.0, 1.0, 1.0, 1.0],
        });
        graph.get_mut(small).expect("small").size = Vec2::new(50.0, 50.0);
        graph.add_child(stage, small);

        let base = [0.1, 0.2, 0.3, 1.0];
        assert_eq!(graph.composite_backdrop(base, viewport), base);
    }
}
