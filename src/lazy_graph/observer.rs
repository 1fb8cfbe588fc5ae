use crate::lazy_graph::params::{ContextPath, ContextStack};
use crate::value::SocketValue;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receives timings and values produced while a lowered graph executes.
/// Callbacks take `&self` since nested group executions share one logger.
pub trait ExecutionLogger: Sync {
    fn on_node_executed(
        &self,
        context: &ContextStack,
        node_name: &str,
        start_instant: Instant,
        end_instant: Instant,
    );
    fn on_value_logged(
        &self,
        context: &ContextStack,
        node_name: &str,
        socket_identifier: &str,
        value: &SocketValue,
    );
}

impl ExecutionLogger for () {
    fn on_node_executed(&self, _context: &ContextStack, _node_name: &str, _start_instant: Instant, _end_instant: Instant) {}
    fn on_value_logged(&self, _context: &ContextStack, _node_name: &str, _socket_identifier: &str, _value: &SocketValue) {}
}

#[derive(Clone, Debug)]
pub struct NodeExecutionTime {
    pub node_name: String,
    pub start_instant: Instant,
    pub end_instant: Instant,
}

impl NodeExecutionTime {
    pub fn duration(&self) -> Duration {
        self.end_instant.duration_since(self.start_instant)
    }
}

#[derive(Clone, Debug)]
pub struct LoggedValue {
    pub node_name: String,
    pub socket_identifier: String,
    pub value: SocketValue,
}

/// Everything logged for one group invocation.
#[derive(Clone, Debug, Default)]
pub struct TreeLog {
    pub node_execution_times: Vec<NodeExecutionTime>,
    pub values: Vec<LoggedValue>,
}

/// Logger collecting per-context [`TreeLog`]s.
#[derive(Debug, Default)]
pub struct EvalLog {
    trees: Mutex<HashMap<ContextPath, TreeLog>>,
}

impl EvalLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tree<R>(&self, context: &ContextStack, f: impl FnOnce(&mut TreeLog) -> R) -> R {
        let mut trees = self.trees.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(trees.entry(context.path()).or_default())
    }

    pub fn tree_log(&self, path: &ContextPath) -> Option<TreeLog> {
        let trees = self.trees.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        trees.get(path).cloned()
    }

    /// Logged contexts, shallowest first.
    pub fn contexts(&self) -> Vec<ContextPath> {
        let trees = self.trees.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut paths: Vec<ContextPath> = trees.keys().cloned().collect();
        paths.sort_by_key(|path| (path.depth(), path.to_string()));
        paths
    }

    pub fn into_trees(self) -> HashMap<ContextPath, TreeLog> {
        self.trees.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExecutionLogger for EvalLog {
    fn on_node_executed(&self, context: &ContextStack, node_name: &str, start_instant: Instant, end_instant: Instant) {
        self.with_tree(context, |tree| {
            tree.node_execution_times.push(NodeExecutionTime {
                node_name: node_name.to_string(),
                start_instant,
                end_instant,
            })
        });
    }

    fn on_value_logged(&self, context: &ContextStack, node_name: &str, socket_identifier: &str, value: &SocketValue) {
        self.with_tree(context, |tree| {
            tree.values.push(LoggedValue {
                node_name: node_name.to_string(),
                socket_identifier: socket_identifier.to_string(),
                value: value.clone(),
            })
        });
    }
}
