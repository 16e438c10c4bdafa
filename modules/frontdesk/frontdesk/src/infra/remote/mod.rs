//! HTTP adapter for the remote directory.

mod http_client;


pub use http_client::HttpRemoteDirectory;
