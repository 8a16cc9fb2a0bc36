//! Wire types for the two interfaces the naming server exposes: `Service`
//! (called by filesystem clients) and `Registration` (called by storage
//! servers at startup).

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RmiError;
use crate::path::Path;
use crate::skeleton::Handler;
use crate::stub::Stub;

/// Errors the `Service` and `Registration` interfaces can return, per
/// spec.md §7.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NamingError {
    #[error("argument must not be null")]
    NullArg,
    #[error("illegal argument: {0}")]
    IllegalArg(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("storage server already registered: {0}")]
    AlreadyRegistered(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error(transparent)]
    Remote(#[from] RmiError),
}

/// The client-visible operations of spec.md §4.G.
pub trait Service: Send + Sync {
    fn is_directory(&self, path: &Path) -> Result<bool, NamingError>;
    fn list(&self, path: &Path) -> Result<Vec<String>, NamingError>;
    fn create_file(&self, path: &Path) -> Result<bool, NamingError>;
    fn create_directory(&self, path: &Path) -> Result<bool, NamingError>;
    fn delete(&self, path: &Path) -> Result<bool, NamingError>;
    fn get_storage(&self, path: &Path) -> Result<SocketAddr, NamingError>;
    /// `client_id` identifies the lock holder across the `lock`/`unlock`
    /// pair. It is chosen by the caller and is opaque to the naming server:
    /// never an OS thread id, since a client may lock on one connection and
    /// unlock on another.
    fn lock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError>;
    fn unlock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError>;
}

/// Registration and reconciliation, spec.md §4.F.
pub trait Registration: Send + Sync {
    fn register(
        &self,
        storage_addr: SocketAddr,
        command_addr: SocketAddr,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, NamingError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServiceRequest {
    IsDirectory { path: Path },
    List { path: Path },
    CreateFile { path: Path },
    CreateDirectory { path: Path },
    Delete { path: Path },
    GetStorage { path: Path },
    Lock { path: Path, exclusive: bool, client_id: u64 },
    Unlock { path: Path, exclusive: bool, client_id: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServiceResponse {
    IsDirectory(Result<bool, NamingError>),
    List(Result<Vec<String>, NamingError>),
    CreateFile(Result<bool, NamingError>),
    CreateDirectory(Result<bool, NamingError>),
    Delete(Result<bool, NamingError>),
    GetStorage(Result<SocketAddr, NamingError>),
    Lock(Result<(), NamingError>),
    Unlock(Result<(), NamingError>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistrationRequest {
    Register { storage_addr: SocketAddr, command_addr: SocketAddr, paths: Vec<Path> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistrationResponse {
    Register(Result<Vec<Path>, NamingError>),
}

pub type ServiceStub = Stub<ServiceRequest, ServiceResponse>;
pub type RegistrationStub = Stub<RegistrationRequest, RegistrationResponse>;

pub const SERVICE_INTERFACE: &str = "Service";
pub const REGISTRATION_INTERFACE: &str = "Registration";

impl ServiceStub {
    pub fn is_directory(&self, path: &Path) -> Result<bool, NamingError> {
        match self.call(&ServiceRequest::IsDirectory { path: path.clone() })? {
            ServiceResponse::IsDirectory(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn list(&self, path: &Path) -> Result<Vec<String>, NamingError> {
        match self.call(&ServiceRequest::List { path: path.clone() })? {
            ServiceResponse::List(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn create_file(&self, path: &Path) -> Result<bool, NamingError> {
        match self.call(&ServiceRequest::CreateFile { path: path.clone() })? {
            ServiceResponse::CreateFile(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn create_directory(&self, path: &Path) -> Result<bool, NamingError> {
        match self.call(&ServiceRequest::CreateDirectory { path: path.clone() })? {
            ServiceResponse::CreateDirectory(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn delete(&self, path: &Path) -> Result<bool, NamingError> {
        match self.call(&ServiceRequest::Delete { path: path.clone() })? {
            ServiceResponse::Delete(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn get_storage(&self, path: &Path) -> Result<SocketAddr, NamingError> {
        match self.call(&ServiceRequest::GetStorage { path: path.clone() })? {
            ServiceResponse::GetStorage(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn lock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        match self.call(&ServiceRequest::Lock { path: path.clone(), exclusive, client_id })? {
            ServiceResponse::Lock(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }

    pub fn unlock(&self, path: &Path, exclusive: bool, client_id: u64) -> Result<(), NamingError> {
        match self.call(&ServiceRequest::Unlock { path: path.clone(), exclusive, client_id })? {
            ServiceResponse::Unlock(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }
}

impl RegistrationStub {
    pub fn register(
        &self,
        storage_addr: SocketAddr,
        command_addr: SocketAddr,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, NamingError> {
        match self.call(&RegistrationRequest::Register { storage_addr, command_addr, paths })? {
            RegistrationResponse::Register(r) => r,
            _ => Err(NamingError::IllegalState("mismatched response variant".into())),
        }
    }
}

/// Wraps any [`Service`] implementation as an RMI [`Handler`].
pub struct ServiceHandler<T>(pub T);

impl<T: Service + 'static> Handler for ServiceHandler<T> {
    type Request = ServiceRequest;
    type Response = ServiceResponse;

    fn handle(&self, request: ServiceRequest) -> ServiceResponse {
        match request {
            ServiceRequest::IsDirectory { path } => {
                ServiceResponse::IsDirectory(self.0.is_directory(&path))
            }
            ServiceRequest::List { path } => ServiceResponse::List(self.0.list(&path)),
            ServiceRequest::CreateFile { path } => {
                ServiceResponse::CreateFile(self.0.create_file(&path))
            }
            ServiceRequest::CreateDirectory { path } => {
                ServiceResponse::CreateDirectory(self.0.create_directory(&path))
            }
            ServiceRequest::Delete { path } => ServiceResponse::Delete(self.0.delete(&path)),
            ServiceRequest::GetStorage { path } => {
                ServiceResponse::GetStorage(self.0.get_storage(&path))
            }
            ServiceRequest::Lock { path, exclusive, client_id } => {
                ServiceResponse::Lock(self.0.lock(&path, exclusive, client_id))
            }
            ServiceRequest::Unlock { path, exclusive, client_id } => {
                ServiceResponse::Unlock(self.0.unlock(&path, exclusive, client_id))
            }
        }
    }
}

/// Wraps any [`Registration`] implementation as an RMI [`Handler`].
pub struct RegistrationHandler<T>(pub T);

impl<T: Registration + 'static> Handler for RegistrationHandler<T> {
    type Request = RegistrationRequest;
    type Response = RegistrationResponse;

    fn handle(&self, request: RegistrationRequest) -> RegistrationResponse {
        match request {
            RegistrationRequest::Register { storage_addr, command_addr, paths } => {
                RegistrationResponse::Register(self.0.register(storage_addr, command_addr, paths))
            }
        }
    }
}
