//! marketlist: local product list with replace-all sync to a marketlist server.

pub mod commands;
pub mod config;
pub mod server;
