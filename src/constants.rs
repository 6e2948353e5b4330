// src/constants.rs

/// Capacity of the command accumulation buffer. A line exceeding it is a
/// connection-fatal error.
pub const CMD_BUF_CAPACITY: usize = 4096;

/// Transfer buffer capacity used when the config does not set one.
pub const DEFAULT_XFER_BUF_CAPACITY: usize = 32 * 1024;

/// Telnet data-mark byte that ends an urgent resynchronization.
pub const TELNET_DM: u8 = 0xF2;

pub const DEFAULT_LISTEN_PORT: u16 = 2121;
