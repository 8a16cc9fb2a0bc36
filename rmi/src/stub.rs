//! The client side of the RMI transport: a dynamic proxy for a remote
//! interface, identified by the interface name and the remote address.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::net::{SocketAddr, TcpStream};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RmiError;
use crate::skeleton::{Handler, Skeleton};
use crate::wire::{read_frame, write_frame};

/// A client-side proxy for a remote interface whose requests are `Req` and
/// whose responses are `Resp`.
///
/// `equals`/`hashCode`/`toString` are never forwarded to the remote peer
/// (spec.md §4.B): two stubs compare equal iff they share an interface
/// name and remote address.
pub struct Stub<Req, Resp> {
    addr: SocketAddr,
    interface: &'static str,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Stub<Req, Resp> {
    /// Builds a stub from an explicit address, for bootstrap (variant c).
    pub fn at(addr: SocketAddr, interface: &'static str) -> Self {
        Stub { addr, interface, _marker: PhantomData }
    }

    /// Builds a stub inheriting a started/bound skeleton's address
    /// (variant a).
    pub fn from_skeleton<H>(skeleton: &Skeleton<H>, interface: &'static str) -> Result<Self, RmiError>
    where
        H: Handler<Request = Req, Response = Resp>,
    {
        let addr = skeleton.local_addr().ok_or(RmiError::NotStarted)?;
        if addr.ip().is_unspecified() {
            return Err(RmiError::UnknownHost);
        }
        Ok(Stub { addr, interface, _marker: PhantomData })
    }

    /// Builds a stub from a started skeleton, replacing its host with
    /// `host` while keeping its port (variant b).
    pub fn from_skeleton_with_host<H>(
        skeleton: &Skeleton<H>,
        host: &str,
        interface: &'static str,
    ) -> Result<Self, RmiError>
    where
        H: Handler<Request = Req, Response = Resp>,
    {
        let bound = skeleton.local_addr().ok_or(RmiError::NotStarted)?;
        let ip = host.parse().map_err(|_| RmiError::UnknownHost)?;
        Ok(Stub { addr: SocketAddr::new(ip, bound.port()), interface, _marker: PhantomData })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }
}

impl<Req: Serialize, Resp: DeserializeOwned> Stub<Req, Resp> {
    /// Marshals `request`, sends it to the remote skeleton, and unmarshals
    /// the response. Connection, marshalling, and transport-level server
    /// errors all surface as `RmiError::RemoteError`.
    pub fn call(&self, request: &Req) -> Result<Resp, RmiError> {
        let mut stream = TcpStream::connect(self.addr).map_err(RmiError::from_io)?;
        write_frame(&mut stream, request)?;
        read_frame(&mut stream)
    }
}

impl<Req, Resp> Clone for Stub<Req, Resp> {
    fn clone(&self) -> Self {
        Stub { addr: self.addr, interface: self.interface, _marker: PhantomData }
    }
}

impl<Req, Resp> fmt::Debug for Stub<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub").field("interface", &self.interface).field("addr", &self.addr).finish()
    }
}

impl<Req, Resp> fmt::Display for Stub<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.interface, self.addr)
    }
}

impl<Req, Resp> PartialEq for Stub<Req, Resp> {
    fn eq(&self, other: &Self) -> bool {
        self.interface == other.interface && self.addr == other.addr
    }
}
impl<Req, Resp> Eq for Stub<Req, Resp> {}

impl<Req, Resp> Hash for Stub<Req, Resp> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.interface.hash(state);
        self.addr.hash(state);
    }
}
