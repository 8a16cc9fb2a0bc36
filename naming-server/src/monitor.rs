//! The single monitor guarding the whole naming server: the directory tree,
//! the lock queues, and the storage registry all live behind one
//! `Mutex`/`Condvar` pair, per spec.md §5. Finer-grained locking is left as
//! a possible future optimization, not a correctness requirement — every
//! operation here is already safe to call concurrently from any number of
//! RMI worker threads.

use std::net::SocketAddr;
use std::sync::{Condvar, Mutex, MutexGuard};

use rmi::protocol::naming::NamingError;
use rmi::Path;

use crate::lock::LockTable;
use crate::replication;
use crate::storage::{StorageId, StorageRegistry};
use crate::tree::{Node, NodeId, Tree};

/// Default replication factor, used when no `--replication-factor`/config
/// value is supplied.
pub const DEFAULT_REPLICATION_ALPHA: f64 = 0.3;

struct State {
    tree: Tree,
    locks: LockTable,
    registry: StorageRegistry,
}

pub struct Monitor {
    state: Mutex<State>,
    condvar: Condvar,
    replication_alpha: f64,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    pub fn new() -> Self {
        Self::with_replication_alpha(DEFAULT_REPLICATION_ALPHA)
    }

    pub fn with_replication_alpha(replication_alpha: f64) -> Self {
        Monitor {
            state: Mutex::new(State { tree: Tree::new(), locks: LockTable::new(), registry: StorageRegistry::new() }),
            condvar: Condvar::new(),
            replication_alpha,
        }
    }

    pub fn is_directory(&self, path: &Path) -> Result<bool, NamingError> {
        self.state.lock().unwrap().tree.is_directory(path)
    }

    pub fn list(&self, path: &Path) -> Result<Vec<String>, NamingError> {
        self.state.lock().unwrap().tree.list(path)
    }

    pub fn create_directory(&self, path: &Path) -> Result<bool, NamingError> {
        self.state.lock().unwrap().tree.create_directory(path)
    }

    /// Creates a new, empty file on whichever storage server registered
    /// first. Fails if no storage server is registered at all.
    pub fn create_file(&self, path: &Path) -> Result<bool, NamingError> {
        let guard = self.state.lock().unwrap();
        if guard.registry.is_empty() {
            return Err(NamingError::IllegalState("no storage servers are registered".into()));
        }
        let primary = guard.registry.ids().next().expect("checked non-empty above");
        let command_stub = guard.registry.get(primary).unwrap().command_stub.clone();
        drop(guard);

        command_stub.create(path).map_err(|e| NamingError::IllegalState(e.to_string()))?;

        self.state.lock().unwrap().tree.create_file(path, primary)
    }

    pub fn delete(&self, path: &Path) -> Result<bool, NamingError> {
        let mut guard = self.state.lock().unwrap();
        let removed_files = guard.tree.delete(path)?;

        let mut command_stubs = Vec::new();
        for file_id in removed_files {
            let holders = match guard.tree.node(file_id) {
                Node::File { primary, replicas, .. } => {
                    let mut v = vec![*primary];
                    v.extend(replicas.iter().copied());
                    v
                }
                Node::Directory { .. } => Vec::new(),
            };
            for id in holders {
                command_stubs.push(guard.registry.get(id).unwrap().command_stub.clone());
            }
        }
        drop(guard);

        for stub in command_stubs {
            if let Err(e) = stub.delete(path) {
                tracing::warn!(error = %e, "storage server failed to delete a file during directory teardown");
            }
        }
        Ok(true)
    }

    /// Returns the file's primary storage reference. Replicas exist only to
    /// absorb read-lock pressure on the naming side; clients are always
    /// directed to the primary.
    pub fn get_storage(&self, path: &Path) -> Result<SocketAddr, NamingError> {
        let guard = self.state.lock().unwrap();
        let id = guard.tree.resolve(path).ok_or_else(|| NamingError::NotFound(path.to_string()))?;
        let primary = match guard.tree.node(id) {
            Node::File { primary, .. } => *primary,
            Node::Directory { .. } => return Err(NamingError::NotADirectory(path.to_string())),
        };
        Ok(guard.registry.get(primary).unwrap().storage_addr)
    }

    pub fn register(
        &self,
        storage_addr: SocketAddr,
        command_addr: SocketAddr,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, NamingError> {
        let mut guard = self.state.lock().unwrap();
        if guard.registry.is_registered(storage_addr) {
            return Err(NamingError::AlreadyRegistered(storage_addr.to_string()));
        }
        let id = guard.registry.insert(storage_addr, command_addr);
        let mut duplicates = Vec::new();
        for path in paths {
            // An intermediate component that already exists as a file
            // collides with this path; abandon just this path, not the
            // whole registration.
            match ensure_parent_directories(&mut guard.tree, &path) {
                Ok(()) => {}
                Err(NamingError::NotADirectory(_)) => {
                    duplicates.push(path);
                    continue;
                }
                Err(e) => return Err(e),
            }
            match guard.tree.create_file(&path, id) {
                Ok(true) => {}
                Ok(false) => duplicates.push(path),
                Err(NamingError::NotADirectory(_)) => duplicates.push(path),
                Err(e) => return Err(e),
            }
        }
        Ok(duplicates)
    }

    /// Acquires `path`'s lock (and a shared lock on every ancestor),
    /// blocking the calling RMI worker thread until granted.
    ///
    /// A shared acquisition on a file counts toward the replication
    /// threshold and may kick off a single replica copy. An exclusive
    /// acquisition invalidates the file first: every replica is told to
    /// delete the file and `replica_refs`/`read_count` are cleared while
    /// still holding the monitor, so a writer is never granted while a
    /// replica could still serve a stale read.
    pub fn lock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        let mut guard = self.state.lock().unwrap();
        let target = guard.tree.resolve(path).ok_or_else(|| NamingError::NotFound(path.to_string()))?;
        let mut chain = guard.tree.ancestor_chain(path);
        chain.pop(); // the target is locked below, with the caller's requested mode

        for ancestor in chain {
            guard = self.acquire(guard, ancestor, client_id, false);
        }
        guard = self.acquire(guard, target, client_id, exclusive);

        let stale_replica_ids: Vec<StorageId> = if exclusive {
            match guard.tree.node_mut(target) {
                Node::File { read_count, replicas, .. } => {
                    *read_count = 0;
                    std::mem::take(replicas)
                }
                Node::Directory { .. } => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let mut replication_job = None;
        if !exclusive {
            let file_info = match guard.tree.node_mut(target) {
                Node::File { read_count, replicas, primary, .. } => {
                    *read_count += 1;
                    Some((*read_count, replicas.clone(), *primary))
                }
                Node::Directory { .. } => None,
            };
            if let Some((read_count, replicas, primary_id)) = file_info {
                let other_servers = guard.registry.len().saturating_sub(1);
                if replication::should_replicate(read_count, replicas.len(), self.replication_alpha, other_servers) {
                    let taken: Vec<StorageId> = std::iter::once(primary_id).chain(replicas).collect();
                    if let Some(dest) = guard.registry.ids().find(|id| !taken.contains(id)) {
                        let source_addr = guard.registry.get(primary_id).unwrap().storage_addr;
                        let dest_command = guard.registry.get(dest).unwrap().command_stub.clone();
                        replication_job = Some((source_addr, dest_command, dest));
                    }
                }
            }
        }

        let stale_commands: Vec<_> =
            stale_replica_ids.into_iter().map(|id| guard.registry.get(id).unwrap().command_stub.clone()).collect();
        drop(guard);

        for stub in stale_commands {
            if let Err(e) = stub.delete(path) {
                tracing::warn!(error = %e, "failed to invalidate a stale replica before granting a write lock");
            }
        }

        if let Some((source_addr, dest_command, dest_id)) = replication_job {
            match dest_command.copy(path, source_addr) {
                Ok(true) => {
                    let mut guard = self.state.lock().unwrap();
                    if let Node::File { replicas, .. } = guard.tree.node_mut(target) {
                        replicas.push(dest_id);
                    }
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "replica copy failed"),
            }
        }
        Ok(())
    }

    /// Releases `path`'s lock and every ancestor's shared lock. `_exclusive`
    /// is accepted to match the wire interface but the lock queue already
    /// knows which mode `client_id` holds; replica invalidation happens at
    /// exclusive-grant time in [`Monitor::lock`], not here.
    pub fn unlock(&self, path: &Path, _exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        let mut guard = self.state.lock().unwrap();
        let target = guard.tree.resolve(path).ok_or_else(|| NamingError::IllegalArg(path.to_string()))?;
        let mut chain = guard.tree.ancestor_chain(path);
        chain.pop();

        if !guard.locks.release(target, client_id) {
            return Err(NamingError::IllegalState(format!("{path} is not locked by client {client_id}")));
        }

        for ancestor in chain.into_iter().rev() {
            guard.locks.release(ancestor, client_id);
        }
        self.condvar.notify_all();
        Ok(())
    }

    fn acquire<'a>(
        &self,
        mut guard: MutexGuard<'a, State>,
        node: NodeId,
        holder: u64,
        exclusive: bool,
    ) -> MutexGuard<'a, State> {
        guard.locks.enqueue(node, holder, exclusive);
        self.condvar.wait_while(guard, |s| !s.locks.is_granted(node, holder)).unwrap()
    }
}

fn ensure_parent_directories(tree: &mut Tree, path: &Path) -> Result<(), NamingError> {
    let components = path.components();
    let mut prefix = Path::root();
    for component in &components[..components.len().saturating_sub(1)] {
        prefix = prefix.join(component).map_err(|_| NamingError::InvalidPath(path.to_string()))?;
        if tree.resolve(&prefix).is_none() {
            tree.create_directory(&prefix)?;
        }
    }
    Ok(())
}
