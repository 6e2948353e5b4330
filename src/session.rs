use std::io::{self, Write};
use std::net::{SocketAddrV4, TcpListener, TcpStream};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::trace;

use crate::buffer::XferBuf;
use crate::constants::CMD_BUF_CAPACITY;
use crate::core_listing::MlstFacts;
use crate::core_transfer::Transfer;

/// The session state machine. Exactly one state is active at a time;
/// every transition back into `AwaitingCommand` releases the open file or
/// directory handle and, per the caller's close flags, the data sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCommand,
    AwaitingDataConnection,
    TransferringData,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SessionFlags {
    /// Transfer type is binary. TYPE A/E are rejected, so this only ever
    /// flips through `TYPE I` / `TYPE L 8`.
    pub binary: bool,
    /// PASV negotiated; the passive listener will supply the data socket.
    pub passive_ready: bool,
    /// PORT negotiated; the server connects out for the data socket.
    pub active_ready: bool,
    /// A store transfer is pulling from the data socket.
    pub receiving: bool,
    /// A retrieve/listing transfer is pushing to the data socket.
    pub sending: bool,
    /// Telnet urgent resynchronization is in progress.
    pub urgent: bool,
}

/// One connected client: its sockets, buffers, cursors and state machine.
///
/// The session exclusively owns everything it references; dropping it (or
/// transitioning to `AwaitingCommand`) is sufficient cleanup.
#[derive(Debug)]
pub struct Session {
    pub control: TcpStream,
    pub data: Option<TcpStream>,
    pub pasv_listener: Option<TcpListener>,
    /// PORT target, big-endian split parsed from the client argument.
    pub peer_addr: Option<SocketAddrV4>,
    /// Address the passive listener was bound to, advertised in the 227.
    pub pasv_addr: Option<SocketAddrV4>,
    pub state: SessionState,
    /// The active transfer step; present only while `state` is not
    /// `AwaitingCommand`.
    pub transfer: Option<Transfer>,
    pub flags: SessionFlags,
    /// Set by REST, consumed by the next STOR/APPE/RETR.
    pub restart_offset: u64,
    pub mlst_facts: MlstFacts,
    /// Current directory, absolute and separator normalized.
    pub current_dir: String,
    /// The directory a listing froze when it started.
    pub list_dir: String,
    pub rename_from: Option<String>,
    pub cmd_buf: XferBuf,
    /// Queued control-channel output, flushed once per tick.
    pub ctrl_out: Vec<u8>,
    pub xfer_buf: XferBuf,
    pub last_command_at: DateTime<Local>,
    pub should_close: bool,
    base: PathBuf,
}

impl Session {
    pub fn new(control: TcpStream, base: PathBuf, xfer_capacity: usize) -> io::Result<Self> {
        control.set_nonblocking(true)?;
        Ok(Self {
            control,
            data: None,
            pasv_listener: None,
            peer_addr: None,
            pasv_addr: None,
            state: SessionState::AwaitingCommand,
            transfer: None,
            flags: SessionFlags {
                binary: true,
                ..Default::default()
            },
            restart_offset: 0,
            mlst_facts: MlstFacts::default(),
            current_dir: String::from("/"),
            list_dir: String::from("/"),
            rename_from: None,
            cmd_buf: XferBuf::new(CMD_BUF_CAPACITY),
            ctrl_out: Vec::new(),
            xfer_buf: XferBuf::new(xfer_capacity),
            last_command_at: Local::now(),
            should_close: false,
            base,
        })
    }

    /// Queues a single-line response.
    pub fn reply(&mut self, code: u16, text: &str) {
        trace!("-> {} {}", code, text);
        self.ctrl_out
            .extend_from_slice(format!("{} {}\r\n", code, text).as_bytes());
    }

    /// Queues the opening line of a multi-line response (`NNN-text`).
    pub fn reply_open(&mut self, code: u16, text: &str) {
        trace!("-> {}-{}", code, text);
        self.ctrl_out
            .extend_from_slice(format!("{}-{}\r\n", code, text).as_bytes());
    }

    /// Queues a preformatted line (already CRLF terminated).
    pub fn reply_raw(&mut self, line: &str) {
        self.ctrl_out.extend_from_slice(line.as_bytes());
    }

    /// Maps a virtual absolute path onto the served root.
    pub fn real_path(&self, virt: &str) -> PathBuf {
        self.base.join(virt.trim_start_matches('/'))
    }

    /// Returns to `AwaitingCommand`, releasing the open file/directory
    /// handle and, per the close flags, the data-path sockets. The
    /// PASV/PORT grants are one-shot, so both ready flags clear here too.
    pub fn enter_idle(&mut self, close_data: bool, close_pasv: bool) {
        self.state = SessionState::AwaitingCommand;
        self.transfer = None;
        self.xfer_buf.clear();
        self.flags.receiving = false;
        self.flags.sending = false;
        self.flags.passive_ready = false;
        self.flags.active_ready = false;
        if close_data {
            self.data = None;
            self.peer_addr = None;
        }
        if close_pasv {
            self.pasv_listener = None;
            self.pasv_addr = None;
        }
    }

    /// Consumes the REST offset.
    pub fn take_restart_offset(&mut self) -> u64 {
        std::mem::take(&mut self.restart_offset)
    }

    /// Writes as much queued control output as the socket accepts.
    /// Would-block leaves the remainder for the next tick.
    pub fn flush_ctrl(&mut self) -> io::Result<()> {
        while !self.ctrl_out.is_empty() {
            match self.control.write(&self.ctrl_out) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "control connection closed",
                    ))
                }
                Ok(n) => {
                    self.ctrl_out.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
