//! Round-trips a toy interface over a real loopback TCP connection, and
//! checks that a remote-side domain error comes back as that error, while an
//! unreachable skeleton surfaces as `RmiError::RemoteError`.

use std::net::{SocketAddr, TcpListener};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rmi::error::RmiError;
use rmi::skeleton::{Handler, Skeleton};
use rmi::stub::Stub;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
enum EchoError {
    #[error("no value stored")]
    Empty,
    #[error(transparent)]
    Remote(#[from] RmiError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum EchoRequest {
    Put(String),
    Get,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum EchoResponse {
    Put,
    Get(Result<String, EchoError>),
}

struct EchoHandler(Mutex<Option<String>>);

impl Handler for EchoHandler {
    type Request = EchoRequest;
    type Response = EchoResponse;

    fn handle(&self, request: EchoRequest) -> EchoResponse {
        match request {
            EchoRequest::Put(v) => {
                *self.0.lock().unwrap() = Some(v);
                EchoResponse::Put
            }
            EchoRequest::Get => {
                let guard = self.0.lock().unwrap();
                EchoResponse::Get(guard.clone().ok_or(EchoError::Empty))
            }
        }
    }
}

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[test]
fn round_trips_through_a_real_socket() {
    let addr = free_port();
    let skeleton = Skeleton::new(Some(addr), EchoHandler(Mutex::new(None)));
    skeleton.start().unwrap();

    let stub: Stub<EchoRequest, EchoResponse> = Stub::from_skeleton(&skeleton, "Echo").unwrap();
    stub.call(&EchoRequest::Put("hello".into())).unwrap();
    match stub.call(&EchoRequest::Get).unwrap() {
        EchoResponse::Get(Ok(v)) => assert_eq!(v, "hello"),
        other => panic!("unexpected response: {other:?}"),
    }

    skeleton.stop();
}

#[test]
fn a_domain_error_crosses_the_wire_as_itself() {
    let addr = free_port();
    let skeleton = Skeleton::new(Some(addr), EchoHandler(Mutex::new(None)));
    skeleton.start().unwrap();
    let stub: Stub<EchoRequest, EchoResponse> = Stub::from_skeleton(&skeleton, "Echo").unwrap();

    match stub.call(&EchoRequest::Get).unwrap() {
        EchoResponse::Get(Err(EchoError::Empty)) => {}
        other => panic!("expected Empty, got {other:?}"),
    }

    skeleton.stop();
}

#[test]
fn an_unreachable_skeleton_is_a_remote_error() {
    let addr = free_port();
    let stub: Stub<EchoRequest, EchoResponse> = Stub::at(addr, "Echo");
    let err = stub.call(&EchoRequest::Get).unwrap_err();
    assert!(matches!(err, RmiError::RemoteError(_)));
}
