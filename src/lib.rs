//! An embeddable, tick-driven FTP server.
//!
//! The server never blocks and never spawns: the host application calls
//! [`FtpServer::tick`] once per iteration of its own loop, and every
//! session advances as far as its sockets allow within that single pass.

pub mod buffer;
pub mod config;
pub mod constants;
pub mod core_cli;
pub mod core_ftpcommand;
pub mod core_listing;
pub mod core_network;
pub mod core_path;
pub mod core_transfer;
pub mod error;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::FtpError;
pub use server::FtpServer;
pub use session::Session;
