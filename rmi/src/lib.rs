//! Shared path type and RMI transport used by both `naming-server` and
//! `storage-server`: a skeleton/stub pair modeled on Java RMI, but dispatched
//! through per-interface request/response enums instead of reflection.

pub mod error;
pub mod path;
pub mod protocol;
pub mod skeleton;
pub mod stub;
pub mod wire;

pub use error::RmiError;
pub use path::{Path, PathError};
pub use skeleton::{Handler, Skeleton};
pub use stub::Stub;
