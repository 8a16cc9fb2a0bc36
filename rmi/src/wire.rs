//! Wire framing for the RMI transport.
//!
//! Each frame is a 4-byte big-endian length prefix followed by a
//! `serde_json`-encoded payload. JSON is a self-describing object-graph
//! encoding, satisfying spec.md §6's requirement that the receiver be able
//! to reconstruct typed values without an out-of-band schema.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RmiError;

const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), RmiError> {
    let payload = serde_json::to_vec(value).map_err(|e| RmiError::RemoteError(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| RmiError::RemoteError("frame exceeds maximum length".into()))?;
    writer.write_all(&len.to_be_bytes()).map_err(RmiError::from_io)?;
    writer.write_all(&payload).map_err(RmiError::from_io)?;
    writer.flush().map_err(RmiError::from_io)?;
    Ok(())
}

pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, RmiError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).map_err(RmiError::from_io)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(RmiError::RemoteError(format!(
            "frame length {len} exceeds maximum {MAX_FRAME_LEN}"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(RmiError::from_io)?;
    serde_json::from_slice(&payload).map_err(|e| RmiError::RemoteError(e.to_string()))
}
