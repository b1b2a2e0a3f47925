//! Tool registry
//!
//! Fixed mapping from tool name to capability. Static for a process
//! lifetime, but exposed as an extensible map so new tools can be added
//! without touching the orchestration loop.

use super::{builtin, Tool};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry with the builtin tool set
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for tool in builtin::all_tools() {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Look up a tool; `None` means the request never reaches a handler
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// (name, description, dangerous) triples sorted by name, for listings
    pub fn list(&self) -> Vec<(&'static str, &'static str, bool)> {
        let mut entries: Vec<_> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description(), t.is_dangerous()))
            .collect();
        entries.sort_by_key(|(name, _, _)| *name);
        entries
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new_empty() {
        assert!(ToolRegistry::new().is_empty());
    }

    #[test]
    fn test_builtin_set() {
        let registry = ToolRegistry::with_builtins();
        for name in [
            "file_read",
            "file_write",
            "file_list",
            "web_get",
            "sys_info",
            "python_run",
            "bash",
        ] {
            assert!(registry.contains(name), "missing builtin: {}", name);
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let registry = ToolRegistry::with_builtins();
        assert!(registry.lookup("file_delete").is_none());
    }

    #[test]
    fn test_danger_flags() {
        let registry = ToolRegistry::with_builtins();
        assert!(registry.lookup("bash").unwrap().is_dangerous());
        assert!(registry.lookup("python_run").unwrap().is_dangerous());
        assert!(!registry.lookup("file_read").unwrap().is_dangerous());
        assert!(!registry.lookup("sys_info").unwrap().is_dangerous());
    }

    #[test]
    fn test_list_sorted() {
        let registry = ToolRegistry::with_builtins();
        let names: Vec<_> = registry.list().iter().map(|(n, _, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
