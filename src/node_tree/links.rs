use crate::graph;
use crate::node_tree::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LinkId(pub(crate) u32);

/// Input socket `index` of node `node`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InputSocketRef {
    pub node: NodeId,
    pub index: usize,
}

impl InputSocketRef {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Output socket `index` of node `node`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OutputSocketRef {
    pub node: NodeId,
    pub index: usize,
}

impl OutputSocketRef {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from: OutputSocketRef,
    pub to: InputSocketRef,
    #[serde(default)]
    pub muted: bool,
}

impl graph::Link<NodeId> for Link {
    fn source_node(&self) -> NodeId {
        self.from.node
    }

    fn target_node(&self) -> NodeId {
        self.to.node
    }
}
