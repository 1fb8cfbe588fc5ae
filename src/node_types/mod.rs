//! Behaviour attached to function node type names.
pub mod builtin;

pub use crate::lazy_graph::functions::geometry_node::{GeoNodeExecParams, GeometryExecFn};

use crate::multi_function::MultiFunction;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct NodeTypeInfo {
    pub idname: String,
    /// Callback for nodes that need the full execution params.
    pub execute: Option<GeometryExecFn>,
    /// Whether `execute` requests its inputs itself instead of getting them all up front.
    pub execute_supports_laziness: bool,
    /// Element-wise behaviour for pure function nodes.
    pub multi_function: Option<Arc<dyn MultiFunction>>,
}

impl NodeTypeInfo {
    pub fn geometry(idname: impl Into<String>, execute: impl Fn(&mut GeoNodeExecParams) + Send + Sync + 'static) -> Self {
        Self {
            idname: idname.into(),
            execute: Some(Arc::new(execute)),
            execute_supports_laziness: false,
            multi_function: None,
        }
    }

    pub fn function(idname: impl Into<String>, multi_function: Arc<dyn MultiFunction>) -> Self {
        Self {
            idname: idname.into(),
            execute: None,
            execute_supports_laziness: false,
            multi_function: Some(multi_function),
        }
    }

    pub fn with_laziness(mut self) -> Self {
        self.execute_supports_laziness = true;
        self
    }
}

impl std::fmt::Debug for NodeTypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTypeInfo")
            .field("idname", &self.idname)
            .field("execute", &self.execute.is_some())
            .field("execute_supports_laziness", &self.execute_supports_laziness)
            .field("multi_function", &self.multi_function)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: HashMap<String, NodeTypeInfo>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, info: NodeTypeInfo) {
        debug_assert!(
            info.execute.is_some() || info.multi_function.is_some(),
            "node type {} has neither an execute callback nor a multi-function",
            info.idname
        );
        debug_assert!(
            !self.types.contains_key(&info.idname),
            "node type {} registered twice",
            info.idname
        );
        log::trace!("Registered node type {}", info.idname);
        self.types.insert(info.idname.clone(), info);
    }

    pub fn get(&self, idname: &str) -> Option<&NodeTypeInfo> {
        self.types.get(idname)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
