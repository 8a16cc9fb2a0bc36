//! Implements the wire-level `Service` and `Registration` interfaces on top
//! of the [`Monitor`].

use std::net::SocketAddr;
use std::sync::Arc;

use rmi::protocol::naming::{NamingError, Registration, Service};
use rmi::Path;

use crate::monitor::Monitor;

#[derive(Clone)]
pub struct NamingService(pub Arc<Monitor>);

impl Service for NamingService {
    fn is_directory(&self, path: &Path) -> Result<bool, NamingError> {
        self.0.is_directory(path)
    }

    fn list(&self, path: &Path) -> Result<Vec<String>, NamingError> {
        self.0.list(path)
    }

    fn create_file(&self, path: &Path) -> Result<bool, NamingError> {
        self.0.create_file(path)
    }

    fn create_directory(&self, path: &Path) -> Result<bool, NamingError> {
        self.0.create_directory(path)
    }

    fn delete(&self, path: &Path) -> Result<bool, NamingError> {
        self.0.delete(path)
    }

    fn get_storage(&self, path: &Path) -> Result<SocketAddr, NamingError> {
        self.0.get_storage(path)
    }

    fn lock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        self.0.lock(path, exclusive, client_id)
    }

    fn unlock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        self.0.unlock(path, exclusive, client_id)
    }
}

#[derive(Clone)]
pub struct NamingRegistration(pub Arc<Monitor>);

impl Registration for NamingRegistration {
    fn register(
        &self,
        storage_addr: SocketAddr,
        command_addr: SocketAddr,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, NamingError> {
        self.0.register(storage_addr, command_addr, paths)
    }
}
