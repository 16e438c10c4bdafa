//! Infrastructure adapters: database persistence and the remote directory
//! HTTP client.

pub mod remote;
pub mod storage;
