//! The four remote interfaces spec.md §4 defines, shared between the
//! naming server and storage servers so that both sides agree on the wire
//! format without a separate IDL step.

pub mod naming;
pub mod storage;
