//! Backbone traits shared by the source node tree and the lazy graph.
//!
//! Both layers expose their nodes and links through these traits so that
//! structural passes (ordering, dangling-link checks) are written once.
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

/// A directed connection from a producer node to a consumer node.
pub trait Link<NodeIdT: Clone + Eq + Hash + Debug> {
    fn source_node(&self) -> NodeIdT;
    fn target_node(&self) -> NodeIdT;
}

pub trait Node {
    fn name(&self) -> &str;
    fn input_count(&self) -> usize;
    fn output_count(&self) -> usize;
}

/// Nodes and links of one graph level.
pub trait InnerGraph {
    type NodeId: Clone + Eq + Hash + Debug;
    type AnyNode: Node;
    type AnyLink: Link<Self::NodeId>;

    /// Deterministic iteration over nodes and links.
    fn nodes(&self) -> impl Iterator<Item = Self::NodeId>;
    fn links(&self) -> impl Iterator<Item = Self::AnyLink>;

    fn get_node(&self, id: &Self::NodeId) -> Option<&Self::AnyNode>;

    /// Kahn ordering over all links. `None` when the links form a cycle.
    fn topological_order(&self) -> Option<Vec<Self::NodeId>> {
        let nodes: Vec<Self::NodeId> = self.nodes().collect();
        let mut in_degree: HashMap<Self::NodeId, usize> =
            nodes.iter().map(|id| (id.clone(), 0)).collect();
        let mut successors: HashMap<Self::NodeId, Vec<Self::NodeId>> = HashMap::new();
        for link in self.links() {
            let (source, target) = (link.source_node(), link.target_node());
            if !in_degree.contains_key(&source) || !in_degree.contains_key(&target) {
                continue;
            }
            *in_degree.entry(target.clone()).or_default() += 1;
            successors.entry(source).or_default().push(target);
        }
        let mut ready: VecDeque<Self::NodeId> = nodes
            .iter()
            .filter(|id| in_degree[*id] == 0)
            .cloned()
            .collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(id) = ready.pop_front() {
            if let Some(next) = successors.get(&id) {
                for target in next {
                    let degree = in_degree.entry(target.clone()).or_default();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(target.clone());
                    }
                }
            }
            order.push(id);
        }
        (order.len() == nodes.len()).then_some(order)
    }

    /// Links whose source or target node cannot be resolved.
    fn dangling_links(&self) -> Vec<Self::AnyLink> {
        self.links()
            .filter(|link| {
                self.get_node(&link.source_node()).is_none()
                    || self.get_node(&link.target_node()).is_none()
            })
            .collect()
    }
}
