//! The on-disk half of a storage server: `Storage` serves file data,
//! `Command` manages file and replica lifecycle, per spec.md §4.D/§4.E.
//!
//! Every path the naming server hands this server is relative to `root`;
//! `local_path` is the only place that mapping happens.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::net::SocketAddr;
use std::path::{Path as StdPath, PathBuf};

use rmi::protocol::storage::{Command, Storage, StorageError, STORAGE_INTERFACE};
use rmi::protocol::storage::StorageStub;
use rmi::Path;

pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Self {
        DiskStorage { root }
    }

    fn local_path(&self, path: &Path) -> PathBuf {
        let mut local = self.root.clone();
        for component in path.iter() {
            local.push(component);
        }
        local
    }

    /// Creates every directory in `path`'s prefix before the caller creates
    /// the leaf itself (Design constraint: never create a leaf whose parent
    /// directory does not yet exist on disk).
    fn ensure_parent_dirs(&self, local: &StdPath) -> Result<(), StorageError> {
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

impl Storage for DiskStorage {
    fn size(&self, path: &Path) -> Result<u64, StorageError> {
        let local = self.local_path(path);
        let meta = fs::metadata(&local).map_err(|_| StorageError::NotFound(path.to_string()))?;
        Ok(meta.len())
    }

    fn read(&self, path: &Path, offset: i64, length: u32) -> Result<Vec<u8>, StorageError> {
        if offset < 0 {
            return Err(StorageError::IndexOutOfRange);
        }
        let local = self.local_path(path);
        let mut file = File::open(&local).map_err(|_| StorageError::NotFound(path.to_string()))?;
        let size = file.metadata().map_err(|e| StorageError::Io(e.to_string()))?.len();
        if offset as u64 + length as u64 > size {
            return Err(StorageError::IndexOutOfRange);
        }
        file.seek(SeekFrom::Start(offset as u64)).map_err(|e| StorageError::Io(e.to_string()))?;

        // A single `read` call is not guaranteed to fill the buffer even
        // when enough data remains, so loop until `length` bytes have been
        // collected or the file is exhausted.
        let mut buf = vec![0u8; length as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..]).map_err(|e| StorageError::Io(e.to_string()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn write(&self, path: &Path, offset: i64, data: Vec<u8>) -> Result<(), StorageError> {
        if offset < 0 {
            return Err(StorageError::IndexOutOfRange);
        }
        let local = self.local_path(path);
        let mut file = OpenOptions::new()
            .write(true)
            .open(&local)
            .map_err(|_| StorageError::NotFound(path.to_string()))?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(|e| StorageError::Io(e.to_string()))?;
        file.write_all(&data).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }
}

pub struct DiskCommand {
    storage: DiskStorage,
}

impl DiskCommand {
    pub fn new(root: PathBuf) -> Self {
        DiskCommand { storage: DiskStorage::new(root) }
    }
}

impl Command for DiskCommand {
    fn create(&self, path: &Path) -> Result<bool, StorageError> {
        let local = self.storage.local_path(path);
        if local.exists() {
            return Ok(false);
        }
        self.storage.ensure_parent_dirs(&local)?;
        File::create(&local).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(true)
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        let local = self.storage.local_path(path);
        if !local.exists() {
            return Ok(false);
        }
        if local.is_dir() {
            fs::remove_dir_all(&local).map_err(|e| StorageError::Io(e.to_string()))?;
        } else {
            fs::remove_file(&local).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        Ok(true)
    }

    fn copy(&self, path: &Path, source_storage: SocketAddr) -> Result<bool, StorageError> {
        let source = StorageStub::at(source_storage, STORAGE_INTERFACE);
        let size = source.size(path)?;
        let data = source.read(path, 0, size as u32)?;

        let local = self.storage.local_path(path);
        self.storage.ensure_parent_dirs(&local)?;
        let mut file = File::create(&local).map_err(|e| StorageError::Io(e.to_string()))?;
        file.write_all(&data).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root() -> PathBuf {
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("naming-server-storage-test-{}-{n}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn create_then_write_then_read_round_trips() {
        let root = test_root();
        let storage = DiskStorage::new(root.clone());
        let command = DiskCommand::new(root);
        let path = Path::new("/a/b.txt").unwrap();

        assert!(command.create(&path).unwrap());
        assert!(!command.create(&path).unwrap());
        storage.write(&path, 0, b"hello world".to_vec()).unwrap();
        assert_eq!(storage.size(&path).unwrap(), 11);
        assert_eq!(storage.read(&path, 6, 5).unwrap(), b"world");
    }

    #[test]
    fn reading_past_the_end_is_out_of_range() {
        let root = test_root();
        let storage = DiskStorage::new(root.clone());
        let command = DiskCommand::new(root);
        let path = Path::new("/f.txt").unwrap();
        command.create(&path).unwrap();
        storage.write(&path, 0, b"abc".to_vec()).unwrap();
        assert!(matches!(storage.read(&path, 0, 10), Err(StorageError::IndexOutOfRange)));
    }

    #[test]
    fn delete_removes_a_directory_recursively() {
        let root = test_root();
        let command = DiskCommand::new(root.clone());
        command.create(&Path::new("/dir/f.txt").unwrap()).unwrap();
        assert!(command.delete(&Path::new("/dir").unwrap()).unwrap());
        assert!(!root.join("dir").exists());
    }
}
