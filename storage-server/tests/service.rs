//! Exercises `Storage` and `Command` as a real client would: over loopback
//! TCP stubs talking to skeletons wrapping [`storage_server`]'s disk-backed
//! implementations, including a replica copy between two storage servers.

use std::net::{SocketAddr, TcpListener};

use rmi::protocol::storage::{CommandHandler, StorageHandler};
use rmi::protocol::storage::{CommandStub, StorageStub, COMMAND_INTERFACE, STORAGE_INTERFACE};
use rmi::Skeleton;

#[path = "../src/disk.rs"]
mod disk;
use disk::{DiskCommand, DiskStorage};

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn test_root(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("storage-server-it-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn start_server(root: std::path::PathBuf) -> (StorageStub, CommandStub) {
    let storage_addr = free_port();
    let storage_skeleton = Skeleton::new(Some(storage_addr), StorageHandler(DiskStorage::new(root.clone())));
    storage_skeleton.start().unwrap();

    let command_addr = free_port();
    let command_skeleton = Skeleton::new(Some(command_addr), CommandHandler(DiskCommand::new(root)));
    command_skeleton.start().unwrap();

    (StorageStub::at(storage_addr, STORAGE_INTERFACE), CommandStub::at(command_addr, COMMAND_INTERFACE))
}

#[test]
fn write_then_read_over_the_wire() {
    let (storage, command) = start_server(test_root("rw"));
    let path = rmi::Path::new("/notes.txt").unwrap();

    assert!(command.create(&path).unwrap());
    storage.write(&path, 0, b"distributed".to_vec()).unwrap();
    assert_eq!(storage.size(&path).unwrap(), 11);
    assert_eq!(storage.read(&path, 0, 11).unwrap(), b"distributed");
}

#[test]
fn copy_replicates_a_file_between_two_servers() {
    let (source_storage, source_command) = start_server(test_root("copy-src"));
    let (dest_storage, dest_command) = start_server(test_root("copy-dst"));
    let path = rmi::Path::new("/shared.bin").unwrap();

    source_command.create(&path).unwrap();
    source_storage.write(&path, 0, b"replicated payload".to_vec()).unwrap();

    assert!(dest_command.copy(&path, source_storage.address()).unwrap());

    assert_eq!(dest_storage.size(&path).unwrap(), 19);
    assert_eq!(dest_storage.read(&path, 0, 19).unwrap(), b"replicated payload");
}

#[test]
fn delete_removes_the_file_from_disk() {
    let (storage, command) = start_server(test_root("delete"));
    let path = rmi::Path::new("/gone.txt").unwrap();
    command.create(&path).unwrap();
    storage.write(&path, 0, b"x".to_vec()).unwrap();

    assert!(command.delete(&path).unwrap());
    assert!(matches!(storage.size(&path), Err(rmi::protocol::storage::StorageError::NotFound(_))));
}
