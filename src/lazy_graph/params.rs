use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::observer::ExecutionLogger;
use crate::value::SocketValue;
use serde::{Deserialize, Serialize};

/// Access a function has to its inputs and outputs while it executes.
pub trait Params {
    /// Storage for output `index`. Writing it does not mark the output produced.
    fn output_slot(&mut self, index: usize) -> &mut Option<SocketValue>;
    /// The input value if it is already available.
    fn try_get_input(&self, index: usize) -> Option<&SocketValue>;
    /// Like [`Params::try_get_input`], but when the value is missing, asks the
    /// executor to compute it and run the function again afterwards.
    fn try_get_input_or_request(&mut self, index: usize) -> Option<&SocketValue>;
    /// Moves the input value out.
    fn take_input(&mut self, index: usize) -> Option<SocketValue>;
    fn mark_output_produced(&mut self, index: usize);
    fn output_was_produced(&self, index: usize) -> bool;
    /// Whether the caller needs output `index`. `Unused` outputs may be left unproduced.
    fn get_output_usage(&self, _index: usize) -> ValueUsage {
        ValueUsage::Used
    }

    fn set_output(&mut self, index: usize, value: SocketValue) {
        *self.output_slot(index) = Some(value);
        self.mark_output_produced(index);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextEntry {
    Root { tree_name: String },
    Group { node_name: String, tree_name: String },
}

impl std::fmt::Display for ContextEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextEntry::Root { tree_name } => write!(f, "{tree_name}"),
            ContextEntry::Group { node_name, tree_name } => write!(f, "{node_name}({tree_name})"),
        }
    }
}

/// Identifies a (possibly nested) group invocation, root first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPath(pub Vec<ContextEntry>);

impl ContextPath {
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for ContextPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Chain of group invocations leading to the code currently executing.
/// Lives on the call stack; nested group executions push a child entry.
#[derive(Debug)]
pub struct ContextStack<'a> {
    parent: Option<&'a ContextStack<'a>>,
    entry: ContextEntry,
}

impl<'a> ContextStack<'a> {
    pub fn root(tree_name: impl Into<String>) -> Self {
        Self {
            parent: None,
            entry: ContextEntry::Root {
                tree_name: tree_name.into(),
            },
        }
    }

    pub fn push(&'a self, entry: ContextEntry) -> ContextStack<'a> {
        ContextStack {
            parent: Some(self),
            entry,
        }
    }

    pub fn entry(&self) -> &ContextEntry {
        &self.entry
    }

    pub fn path(&self) -> ContextPath {
        let mut entries = vec![self.entry.clone()];
        let mut current = self.parent;
        while let Some(stack) = current {
            entries.push(stack.entry.clone());
            current = stack.parent;
        }
        entries.reverse();
        ContextPath(entries)
    }
}

/// Per-execution data threaded through every function call.
#[derive(Clone, Copy)]
pub struct UserData<'a> {
    pub logger: &'a dyn ExecutionLogger,
    pub context_stack: &'a ContextStack<'a>,
}

impl<'a> UserData<'a> {
    pub fn new(logger: &'a dyn ExecutionLogger, context_stack: &'a ContextStack<'a>) -> Self {
        Self { logger, context_stack }
    }
}

#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub user_data: &'a UserData<'a>,
}

impl<'a> Context<'a> {
    pub fn new(user_data: &'a UserData<'a>) -> Self {
        Self { user_data }
    }

    pub fn context_stack(&self) -> &'a ContextStack<'a> {
        self.user_data.context_stack
    }

    pub fn logger(&self) -> &'a dyn ExecutionLogger {
        self.user_data.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_path() {
        let root = ContextStack::root("Main");
        let group = root.push(ContextEntry::Group {
            node_name: "Outer".to_string(),
            tree_name: "OuterTree".to_string(),
        });
        let inner = group.push(ContextEntry::Group {
            node_name: "Inner".to_string(),
            tree_name: "InnerTree".to_string(),
        });
        let path = inner.path();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "Main > Outer(OuterTree) > Inner(InnerTree)");
        assert_eq!(root.path().depth(), 1);
    }
}
