// Library root: re-exports all modules so integration tests and the binary
// share one API.

pub mod app;
pub mod config;
pub mod db;
pub mod feed;
