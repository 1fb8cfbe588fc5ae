//! Lowering of geometry node trees into lazily executed dataflow graphs.
//!
//! A [`node_tree::NodeTree`] is the user-authored program. [`build_lazy_graph`]
//! translates it into a [`lazy_graph::LazyGraph`] whose functions only compute
//! the inputs a requested output actually depends on.
pub mod compiler;
pub mod field;
pub mod graph;
pub mod lazy_graph;
pub mod multi_function;
pub mod node_tree;
pub mod node_types;
pub mod types;
pub mod value;

pub use compiler::{GroupStrategy, LoweredGraph, LoweringError, LoweringOptions, build_lazy_graph};
pub use node_tree::{NodeTree, NodeTreeBuilder};
pub use node_types::NodeTypeRegistry;
pub use types::TypeRegistry;
pub use value::{GeometrySet, SocketValue, Value};
