//! The in-memory directory tree, per spec.md §3.
//!
//! Nodes live in a flat arena indexed by [`NodeId`] rather than behind
//! `Rc`/`RefCell` parent/child pointers, so the single tree-wide monitor
//! ([`crate::monitor`]) can borrow the whole structure as one `&mut`.

use indexmap::IndexMap;
use rmi::protocol::naming::NamingError;
use rmi::Path;

use crate::storage::StorageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn for_test(n: usize) -> Self {
        NodeId(n)
    }
}

pub enum Node {
    Directory {
        name: String,
        parent: Option<NodeId>,
        children: IndexMap<String, NodeId>,
    },
    File {
        name: String,
        parent: NodeId,
        /// The storage server holding the authoritative copy.
        primary: StorageId,
        /// Read-only replicas, populated by the replication controller.
        replicas: Vec<StorageId>,
        read_count: u64,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory { name, .. } => name,
            Node::File { name, .. } => name,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Directory { parent, .. } => *parent,
            Node::File { parent, .. } => Some(*parent),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }
}

/// The full directory tree. A single root directory node always exists at
/// index 0.
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: vec![Node::Directory { name: String::new(), parent: None, children: IndexMap::new() }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Resolves a path to its node, if present.
    pub fn resolve(&self, path: &Path) -> Option<NodeId> {
        let mut current = self.root();
        for component in path.iter() {
            match &self.nodes[current.0] {
                Node::Directory { children, .. } => current = *children.get(component)?,
                Node::File { .. } => return None,
            }
        }
        Some(current)
    }

    /// Resolves every path component but the last, returning the parent
    /// directory's id. Fails if any ancestor is missing or is a file.
    fn resolve_parent(&self, path: &Path) -> Result<NodeId, NamingError> {
        let parent_path = path.parent().map_err(|_| NamingError::InvalidPath(path.to_string()))?;
        self.resolve(&parent_path)
            .ok_or_else(|| NamingError::NotFound(parent_path.to_string()))
    }

    fn children_of(&self, id: NodeId) -> Result<&IndexMap<String, NodeId>, NamingError> {
        match &self.nodes[id.0] {
            Node::Directory { children, .. } => Ok(children),
            Node::File { name, .. } => Err(NamingError::NotADirectory(name.clone())),
        }
    }

    pub fn is_directory(&self, path: &Path) -> Result<bool, NamingError> {
        let id = self.resolve(path).ok_or_else(|| NamingError::NotFound(path.to_string()))?;
        Ok(self.node(id).is_directory())
    }

    pub fn list(&self, path: &Path) -> Result<Vec<String>, NamingError> {
        let id = self.resolve(path).ok_or_else(|| NamingError::NotFound(path.to_string()))?;
        Ok(self.children_of(id)?.keys().cloned().collect())
    }

    /// Creates an empty directory at `path`. The parent must already exist.
    pub fn create_directory(&mut self, path: &Path) -> Result<bool, NamingError> {
        if path.is_root() {
            return Err(NamingError::IllegalArg("cannot create the root directory".into()));
        }
        let name = path.last().map_err(|_| NamingError::InvalidPath(path.to_string()))?.to_string();
        let parent_id = self.resolve_parent(path)?;
        if !self.node(parent_id).is_directory() {
            return Err(NamingError::NotADirectory(path.parent().unwrap().to_string()));
        }
        if self.children_of(parent_id)?.contains_key(&name) {
            return Ok(false);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Directory { name: name.clone(), parent: Some(parent_id), children: IndexMap::new() });
        match &mut self.nodes[parent_id.0] {
            Node::Directory { children, .. } => {
                children.insert(name, id);
            }
            Node::File { .. } => unreachable!("checked is_directory above"),
        }
        Ok(true)
    }

    /// Creates an empty file at `path`, backed by `primary`. The parent must
    /// already exist.
    pub fn create_file(&mut self, path: &Path, primary: StorageId) -> Result<bool, NamingError> {
        if path.is_root() {
            return Err(NamingError::IllegalArg("cannot create the root as a file".into()));
        }
        let name = path.last().map_err(|_| NamingError::InvalidPath(path.to_string()))?.to_string();
        let parent_id = self.resolve_parent(path)?;
        if !self.node(parent_id).is_directory() {
            return Err(NamingError::NotADirectory(path.parent().unwrap().to_string()));
        }
        if self.children_of(parent_id)?.contains_key(&name) {
            return Ok(false);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::File {
            name: name.clone(),
            parent: parent_id,
            primary,
            replicas: Vec::new(),
            read_count: 0,
        });
        match &mut self.nodes[parent_id.0] {
            Node::Directory { children, .. } => {
                children.insert(name, id);
            }
            Node::File { .. } => unreachable!("checked is_directory above"),
        }
        Ok(true)
    }

    /// Removes `path` and, if it is a directory, everything beneath it.
    /// Returns the ids of every removed file, so callers can tell storage
    /// servers to delete the backing data.
    pub fn delete(&mut self, path: &Path) -> Result<Vec<NodeId>, NamingError> {
        if path.is_root() {
            return Err(NamingError::IllegalArg("cannot delete the root directory".into()));
        }
        let id = self.resolve(path).ok_or_else(|| NamingError::NotFound(path.to_string()))?;
        let parent_id = self.node(id).parent().expect("non-root node has a parent");
        let name = self.node(id).name().to_string();
        match &mut self.nodes[parent_id.0] {
            Node::Directory { children, .. } => {
                children.shift_remove(&name);
            }
            Node::File { .. } => unreachable!("parent of any node is a directory"),
        }
        let mut removed_files = Vec::new();
        self.collect_files(id, &mut removed_files);
        Ok(removed_files)
    }

    fn collect_files(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.nodes[id.0] {
            Node::File { .. } => out.push(id),
            Node::Directory { children, .. } => {
                for child in children.values() {
                    self.collect_files(*child, out);
                }
            }
        }
    }

    /// Every ancestor of `path`, from the root down to (and including, if it
    /// resolves) `path` itself. Used by the lock manager to acquire the
    /// hierarchical chain spec.md §3's locking rule requires.
    pub fn ancestor_chain(&self, path: &Path) -> Vec<NodeId> {
        let mut chain = vec![self.root()];
        let mut current = self.root();
        for component in path.iter() {
            let next = match &self.nodes[current.0] {
                Node::Directory { children, .. } => match children.get(component) {
                    Some(id) => *id,
                    None => break,
                },
                Node::File { .. } => break,
            };
            chain.push(next);
            current = next;
        }
        chain
    }
}
