//! The naming server's registry of storage servers it has accepted via
//! `Registration::register`. Tree nodes reference entries here by
//! [`StorageId`] rather than embedding stubs directly, so a storage server's
//! stubs live in exactly one place.

use std::net::SocketAddr;

use rmi::protocol::storage::{CommandStub, StorageStub};
use rmi::protocol::storage::{COMMAND_INTERFACE, STORAGE_INTERFACE};

/// An opaque handle into a [`StorageRegistry`]. Never a thread id, an
/// address, or anything meaningful outside that registry's own bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(u64);

pub struct StorageRef {
    pub storage_stub: StorageStub,
    pub command_stub: CommandStub,
    pub storage_addr: SocketAddr,
}

#[derive(Default)]
pub struct StorageRegistry {
    entries: Vec<StorageRef>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new storage server, returning its id. Callers are
    /// responsible for checking `is_registered` first: a registry does not
    /// reject duplicate addresses on its own.
    pub fn insert(&mut self, storage_addr: SocketAddr, command_addr: SocketAddr) -> StorageId {
        let id = StorageId(self.entries.len() as u64);
        self.entries.push(StorageRef {
            storage_stub: StorageStub::at(storage_addr, STORAGE_INTERFACE),
            command_stub: CommandStub::at(command_addr, COMMAND_INTERFACE),
            storage_addr,
        });
        id
    }

    pub fn is_registered(&self, storage_addr: SocketAddr) -> bool {
        self.entries.iter().any(|e| e.storage_addr == storage_addr)
    }

    pub fn get(&self, id: StorageId) -> Option<&StorageRef> {
        self.entries.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StorageId> + '_ {
        (0..self.entries.len()).map(|i| StorageId(i as u64))
    }
}
