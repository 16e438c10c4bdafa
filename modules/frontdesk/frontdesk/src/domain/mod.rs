pub mod access;
pub mod error;
pub mod ports;
pub mod post_commit;
pub mod reconcile;
pub mod refresh;
pub mod repos;
pub mod service;
