//! End-to-end exercise of the naming server's monitor against two real
//! (in-memory, RMI-served) storage backends: registration, file creation,
//! lock/unlock, and read-triggered replication.

#[path = "../src/tree.rs"]
mod tree;
#[path = "../src/lock.rs"]
mod lock;
#[path = "../src/replication.rs"]
mod replication;
#[path = "../src/storage.rs"]
mod storage;
#[path = "../src/monitor.rs"]
mod monitor;

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::Mutex;

use rmi::protocol::storage::{Command, CommandHandler, Storage, StorageError, StorageHandler};
use rmi::Path;
use rmi::Skeleton;

use monitor::Monitor;

#[derive(Default)]
struct FakeBackend {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl Storage for FakeBackend {
    fn size(&self, path: &Path) -> Result<u64, StorageError> {
        let files = self.files.lock().unwrap();
        files.get(&path.to_string()).map(|v| v.len() as u64).ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn read(&self, path: &Path, offset: i64, length: u32) -> Result<Vec<u8>, StorageError> {
        let files = self.files.lock().unwrap();
        let data = files.get(&path.to_string()).ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let start = offset as usize;
        let end = (start + length as usize).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn write(&self, path: &Path, _offset: i64, data: Vec<u8>) -> Result<(), StorageError> {
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }
}

impl Command for FakeBackend {
    fn create(&self, path: &Path) -> Result<bool, StorageError> {
        let mut files = self.files.lock().unwrap();
        if files.contains_key(&path.to_string()) {
            return Ok(false);
        }
        files.insert(path.to_string(), Vec::new());
        Ok(true)
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.files.lock().unwrap().remove(&path.to_string()).is_some())
    }

    fn copy(&self, path: &Path, source_storage: SocketAddr) -> Result<bool, StorageError> {
        let source = rmi::protocol::storage::StorageStub::at(source_storage, rmi::protocol::storage::STORAGE_INTERFACE);
        let size = source.size(path)?;
        let data = source.read(path, 0, size as u32)?;
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(true)
    }
}

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Starts a storage backend with its own Storage and Command listeners and
/// returns `(storage_addr, command_addr)`.
fn start_backend() -> (SocketAddr, SocketAddr) {
    let backend = std::sync::Arc::new(FakeBackend::default());

    let storage_addr = free_port();
    let storage_skeleton =
        Skeleton::new(Some(storage_addr), StorageHandler(ArcBackend(backend.clone())));
    storage_skeleton.start().unwrap();

    let command_addr = free_port();
    let command_skeleton = Skeleton::new(Some(command_addr), CommandHandler(ArcBackend(backend)));
    command_skeleton.start().unwrap();

    (storage_addr, command_addr)
}

struct ArcBackend(std::sync::Arc<FakeBackend>);

impl Storage for ArcBackend {
    fn size(&self, path: &Path) -> Result<u64, StorageError> {
        self.0.size(path)
    }
    fn read(&self, path: &Path, offset: i64, length: u32) -> Result<Vec<u8>, StorageError> {
        self.0.read(path, offset, length)
    }
    fn write(&self, path: &Path, offset: i64, data: Vec<u8>) -> Result<(), StorageError> {
        self.0.write(path, offset, data)
    }
}

impl Command for ArcBackend {
    fn create(&self, path: &Path) -> Result<bool, StorageError> {
        self.0.create(path)
    }
    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        self.0.delete(path)
    }
    fn copy(&self, path: &Path, source_storage: SocketAddr) -> Result<bool, StorageError> {
        self.0.copy(path, source_storage)
    }
}

#[test]
fn registration_then_create_then_lock_unlock() {
    let monitor = Monitor::new();
    let (storage_a, command_a) = start_backend();
    monitor.register(storage_a, command_a, Vec::new()).unwrap();

    let path = Path::new("/doc.txt").unwrap();
    assert!(monitor.create_file(&path).unwrap());
    assert!(!monitor.is_directory(&path).unwrap());

    monitor.lock(&path, true, 1).unwrap();
    monitor.unlock(&path, true, 1).unwrap();

    let served = monitor.get_storage(&path).unwrap();
    assert_eq!(served, storage_a);
}

#[test]
fn repeated_reads_trigger_a_replica_without_changing_get_storage() {
    let monitor = Monitor::new();
    let (storage_a, command_a) = start_backend();
    let (storage_b, command_b) = start_backend();
    monitor.register(storage_a, command_a, Vec::new()).unwrap();
    monitor.register(storage_b, command_b, Vec::new()).unwrap();

    let path = Path::new("/hot.txt").unwrap();
    monitor.create_file(&path).unwrap();

    for client_id in 0..20u64 {
        monitor.lock(&path, false, client_id).unwrap();
        monitor.unlock(&path, false, client_id).unwrap();
    }

    // get_storage always answers with the file's primary reference...
    assert_eq!(monitor.get_storage(&path).unwrap(), storage_a);

    // ...but 20 reads should have copied the file onto the other
    // registered server as a replica.
    let replica = rmi::protocol::storage::StorageStub::at(storage_b, rmi::protocol::storage::STORAGE_INTERFACE);
    assert!(replica.size(&path).is_ok(), "expected a replica to exist on the second storage server");
}

#[test]
fn a_write_lock_invalidates_replicas_before_it_is_granted() {
    let monitor = Monitor::new();
    let (storage_a, command_a) = start_backend();
    let (storage_b, command_b) = start_backend();
    monitor.register(storage_a, command_a, Vec::new()).unwrap();
    monitor.register(storage_b, command_b, Vec::new()).unwrap();

    let path = Path::new("/churn.txt").unwrap();
    monitor.create_file(&path).unwrap();
    for client_id in 0..20u64 {
        monitor.lock(&path, false, client_id).unwrap();
        monitor.unlock(&path, false, client_id).unwrap();
    }

    let replica = rmi::protocol::storage::StorageStub::at(storage_b, rmi::protocol::storage::STORAGE_INTERFACE);
    assert!(replica.size(&path).is_ok(), "expected a replica on the second server before the write");

    monitor.lock(&path, true, 999).unwrap();
    monitor.unlock(&path, true, 999).unwrap();

    assert!(
        matches!(replica.size(&path), Err(StorageError::NotFound(_))),
        "expected the exclusive-lock grant to have invalidated the replica"
    );
    assert_eq!(monitor.get_storage(&path).unwrap(), storage_a);
}

#[test]
fn unlocking_a_lock_never_acquired_is_an_illegal_state() {
    let monitor = Monitor::new();
    let (storage_a, command_a) = start_backend();
    monitor.register(storage_a, command_a, Vec::new()).unwrap();

    let path = Path::new("/never-locked.txt").unwrap();
    monitor.create_file(&path).unwrap();

    let err = monitor.unlock(&path, false, 42).unwrap_err();
    assert!(matches!(err, rmi::protocol::naming::NamingError::IllegalState(_)));
}

#[test]
fn registering_a_path_under_an_existing_file_reports_a_duplicate() {
    let monitor = Monitor::new();
    let (storage_a, command_a) = start_backend();

    let collision = Path::new("/a/b.txt").unwrap();
    let duplicates = monitor
        .register(storage_a, command_a, vec![Path::new("/a").unwrap(), collision.clone()])
        .unwrap();

    // "/a" is created as a file first; "/a/b.txt" then collides with it
    // and is reported back as a duplicate instead of aborting registration.
    assert_eq!(duplicates, vec![collision]);
    assert!(!monitor.is_directory(&Path::new("/a").unwrap()).unwrap());
}
