//! Wire types for the two interfaces a storage server exposes: `Storage`
//! (data access, called by clients) and `Command` (administrative, called
//! only by the naming server).

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RmiError;
use crate::path::Path;
use crate::skeleton::Handler;
use crate::stub::Stub;

/// Errors the `Storage` and `Command` interfaces can return, per spec.md §7.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("index out of range")]
    IndexOutOfRange,
    #[error("io error: {0}")]
    Io(String),
    #[error(transparent)]
    Remote(#[from] RmiError),
}

/// File data access, spec.md §4.D.
pub trait Storage: Send + Sync {
    fn size(&self, path: &Path) -> Result<u64, StorageError>;
    fn read(&self, path: &Path, offset: i64, length: u32) -> Result<Vec<u8>, StorageError>;
    fn write(&self, path: &Path, offset: i64, data: Vec<u8>) -> Result<(), StorageError>;
}

/// File and replica lifecycle, spec.md §4.E — invoked only by the naming
/// server, never by filesystem clients.
pub trait Command: Send + Sync {
    fn create(&self, path: &Path) -> Result<bool, StorageError>;
    fn delete(&self, path: &Path) -> Result<bool, StorageError>;
    fn copy(&self, path: &Path, source_storage: SocketAddr) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageRequest {
    Size { path: Path },
    Read { path: Path, offset: i64, length: u32 },
    Write { path: Path, offset: i64, data: Vec<u8> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageResponse {
    Size(Result<u64, StorageError>),
    Read(Result<Vec<u8>, StorageError>),
    Write(Result<(), StorageError>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandRequest {
    Create { path: Path },
    Delete { path: Path },
    Copy { path: Path, source_storage: SocketAddr },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandResponse {
    Create(Result<bool, StorageError>),
    Delete(Result<bool, StorageError>),
    Copy(Result<bool, StorageError>),
}

pub type StorageStub = Stub<StorageRequest, StorageResponse>;
pub type CommandStub = Stub<CommandRequest, CommandResponse>;

pub const STORAGE_INTERFACE: &str = "Storage";
pub const COMMAND_INTERFACE: &str = "Command";

impl StorageStub {
    pub fn size(&self, path: &Path) -> Result<u64, StorageError> {
        match self.call(&StorageRequest::Size { path: path.clone() })? {
            StorageResponse::Size(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }

    pub fn read(&self, path: &Path, offset: i64, length: u32) -> Result<Vec<u8>, StorageError> {
        match self.call(&StorageRequest::Read { path: path.clone(), offset, length })? {
            StorageResponse::Read(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }

    pub fn write(&self, path: &Path, offset: i64, data: Vec<u8>) -> Result<(), StorageError> {
        match self.call(&StorageRequest::Write { path: path.clone(), offset, data })? {
            StorageResponse::Write(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }
}

impl CommandStub {
    pub fn create(&self, path: &Path) -> Result<bool, StorageError> {
        match self.call(&CommandRequest::Create { path: path.clone() })? {
            CommandResponse::Create(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }

    pub fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match self.call(&CommandRequest::Delete { path: path.clone() })? {
            CommandResponse::Delete(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }

    pub fn copy(&self, path: &Path, source_storage: SocketAddr) -> Result<bool, StorageError> {
        match self.call(&CommandRequest::Copy { path: path.clone(), source_storage })? {
            CommandResponse::Copy(r) => r,
            _ => Err(StorageError::Io("mismatched response variant".into())),
        }
    }
}

/// Wraps any [`Storage`] implementation as an RMI [`Handler`].
pub struct StorageHandler<T>(pub T);

impl<T: Storage + 'static> Handler for StorageHandler<T> {
    type Request = StorageRequest;
    type Response = StorageResponse;

    fn handle(&self, request: StorageRequest) -> StorageResponse {
        match request {
            StorageRequest::Size { path } => StorageResponse::Size(self.0.size(&path)),
            StorageRequest::Read { path, offset, length } => {
                StorageResponse::Read(self.0.read(&path, offset, length))
            }
            StorageRequest::Write { path, offset, data } => {
                StorageResponse::Write(self.0.write(&path, offset, data))
            }
        }
    }
}

/// Wraps any [`Command`] implementation as an RMI [`Handler`].
pub struct CommandHandler<T>(pub T);

impl<T: Command + 'static> Handler for CommandHandler<T> {
    type Request = CommandRequest;
    type Response = CommandResponse;

    fn handle(&self, request: CommandRequest) -> CommandResponse {
        match request {
            CommandRequest::Create { path } => CommandResponse::Create(self.0.create(&path)),
            CommandRequest::Delete { path } => CommandResponse::Delete(self.0.delete(&path)),
            CommandRequest::Copy { path, source_storage } => {
                CommandResponse::Copy(self.0.copy(&path, source_storage))
            }
        }
    }
}
