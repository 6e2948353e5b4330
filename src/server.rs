//! The tick-driven server core.
//!
//! The embedding application calls [`FtpServer::tick`] once per iteration
//! of its own main loop. A tick is one zero-timeout readiness pass over
//! every socket the server owns; nothing in here blocks, sleeps or spawns.

use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::constants::TELNET_DM;
use crate::core_ftpcommand::handlers;
use crate::core_network::pasv;
use crate::core_network::poll::{self, PollSet, POLLERR, POLLHUP, POLLIN, POLLOUT, POLLPRI};
use crate::core_network::port;
use crate::core_transfer::StepResult;
use crate::error::FtpError;
use crate::helpers::{format_free_space, get_free_space};
use crate::session::{Session, SessionState};
use crate::Config;

/// Per-session poll registration for one tick.
struct SessionPoll {
    slot: usize,
    ctrl: usize,
    pasv: Option<usize>,
    data: Option<usize>,
}

pub struct FtpServer {
    listener: TcpListener,
    config: Config,
    root: PathBuf,
    /// Slot registry. A slot holds `None` after its session closes and is
    /// reused by the next accepted connection.
    sessions: Vec<Option<Session>>,
    poll_set: PollSet,
}

impl FtpServer {
    /// Binds the control listener and resolves the served root.
    pub fn bind(config: Config) -> io::Result<Self> {
        let root = std::fs::canonicalize(&config.server.root_dir)?;
        let listener = TcpListener::bind(("0.0.0.0", config.server.listen_port))?;
        listener.set_nonblocking(true)?;

        info!(
            "Serving {} on {}",
            root.display(),
            listener.local_addr()?
        );
        if let Some(free) = get_free_space(&root) {
            info!("Free space on volume: {}", format_free_space(free));
        }

        Ok(Self {
            listener,
            config,
            root,
            sessions: Vec::new(),
            poll_set: PollSet::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_some()).count()
    }

    /// One readiness pass: accept, service every session, reap the dead.
    /// Call this once per host-loop iteration.
    pub fn tick(&mut self) -> io::Result<()> {
        self.poll_set.clear();
        let listener_idx = self
            .poll_set
            .push(self.listener.as_raw_fd(), POLLIN);

        let mut registrations = Vec::new();
        for (slot, entry) in self.sessions.iter().enumerate() {
            let session = match entry {
                Some(s) => s,
                None => continue,
            };
            let mut ctrl_events = POLLIN | POLLPRI;
            if !session.ctrl_out.is_empty() {
                ctrl_events |= POLLOUT;
            }
            let ctrl = self
                .poll_set
                .push(session.control.as_raw_fd(), ctrl_events);
            let pasv_idx = match (&session.pasv_listener, session.state) {
                (Some(listener), SessionState::AwaitingDataConnection) => {
                    Some(self.poll_set.push(listener.as_raw_fd(), POLLIN))
                }
                _ => None,
            };
            let data_idx = session.data.as_ref().map(|data| {
                let events = if session.flags.receiving && session.state == SessionState::TransferringData
                {
                    POLLIN
                } else {
                    POLLOUT
                };
                self.poll_set.push(data.as_raw_fd(), events)
            });
            registrations.push(SessionPoll {
                slot,
                ctrl,
                pasv: pasv_idx,
                data: data_idx,
            });
        }

        self.poll_set.poll(0)?;

        if self.poll_set.revents(listener_idx) & POLLIN != 0 {
            self.accept_new();
        }

        for reg in registrations {
            self.service_session(&reg);
        }
        Ok(())
    }

    /// Accepts every connection the listener has pending.
    fn accept_new(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("Control connection from {}", peer);
                    let session = match Session::new(
                        stream,
                        self.root.clone(),
                        self.config.transfer_buffer_size(),
                    ) {
                        Ok(s) => s,
                        Err(e) => {
                            warn!("Failed to set up session for {}: {}", peer, e);
                            continue;
                        }
                    };
                    self.insert(session);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("accept failed: {}", e);
                    return;
                }
            }
        }
    }

    fn insert(&mut self, mut session: Session) {
        let greeting = self
            .config
            .server
            .greeting
            .as_deref()
            .unwrap_or("Service ready.");
        session.reply(220, greeting);
        match self.sessions.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(session),
            None => self.sessions.push(Some(session)),
        }
    }

    /// Runs one session through its readiness results. The session is
    /// detached from its slot while being serviced and either reattached
    /// or dropped at the end.
    fn service_session(&mut self, reg: &SessionPoll) {
        let mut session = match self.sessions[reg.slot].take() {
            Some(s) => s,
            None => return,
        };

        let ctrl_re = self.poll_set.revents(reg.ctrl);
        if ctrl_re & (POLLERR | POLLHUP) != 0 {
            debug!("Control connection dropped");
            return;
        }

        if ctrl_re & POLLPRI != 0 {
            session.flags.urgent = true;
            session.cmd_buf.clear();
        }
        if session.flags.urgent {
            if let Err(e) = urgent_resync(&mut session) {
                warn!("Urgent resync failed: {}", e);
                return;
            }
            if session.should_close {
                let _ = session.flush_ctrl();
                return;
            }
        }

        if ctrl_re & POLLIN != 0 {
            if let Err(e) = read_commands(&mut session, &self.config) {
                warn!("Closing session: {}", e);
                session.reply_raw(&e.to_ftp_response());
                let _ = session.flush_ctrl();
                return;
            }
        }

        if session.state == SessionState::AwaitingDataConnection {
            let pasv_readable = reg
                .pasv
                .map(|idx| self.poll_set.revents(idx) & POLLIN != 0)
                .unwrap_or(false);
            let data_writable = reg
                .data
                .map(|idx| self.poll_set.revents(idx) & (POLLOUT | POLLERR | POLLHUP) != 0)
                .unwrap_or(false);
            advance_data_connection(&mut session, pasv_readable, data_writable);
        }

        if session.state == SessionState::TransferringData {
            drive_transfer(&mut session);
        }

        if let Err(e) = session.flush_ctrl() {
            debug!("Control write failed: {}", e);
            return;
        }
        if session.should_close && session.ctrl_out.is_empty() {
            debug!("Session closed");
            return;
        }

        self.sessions[reg.slot] = Some(session);
    }
}

/// Discards in-band bytes up to the urgent mark, then consumes the
/// out-of-band byte itself. A telnet abort usually flags the Data Mark as
/// the urgent byte, so resynchronization ends right here; otherwise the
/// urgent flag stays set until the Data Mark arrives in the normal stream.
fn urgent_resync(session: &mut Session) -> io::Result<()> {
    let fd = session.control.as_raw_fd();
    let mut scratch = [0u8; 512];
    loop {
        if poll::at_mark(fd)? {
            break;
        }
        match session.control.read(&mut scratch) {
            Ok(0) => {
                session.should_close = true;
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    if poll::recv_oob(fd)? == Some(TELNET_DM) {
        session.flags.urgent = false;
    }
    Ok(())
}

/// Reads whatever the control socket has, accumulates it in the command
/// buffer and dispatches every complete line. A line that outgrows the
/// buffer is fatal for the connection.
fn read_commands(session: &mut Session, config: &Config) -> Result<(), FtpError> {
    let mut chunk = [0u8; 512];
    loop {
        let n = match session.control.read(&mut chunk) {
            Ok(0) => {
                session.should_close = true;
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        let mut bytes = &chunk[..n];
        if session.flags.urgent {
            // Everything up to the Data Mark is the tail of the aborted
            // command; drop it.
            match bytes.iter().position(|&b| b == TELNET_DM) {
                Some(pos) => {
                    session.flags.urgent = false;
                    bytes = &bytes[pos + 1..];
                }
                None => continue,
            }
        }
        if session.cmd_buf.extend(bytes).is_err() {
            return Err(FtpError::CommandOverflow);
        }
        process_lines(session, config)?;
        if session.should_close {
            break;
        }
    }
    Ok(())
}

fn process_lines(session: &mut Session, config: &Config) -> Result<(), FtpError> {
    loop {
        let rem = session.cmd_buf.remaining();
        let pos = match rem.iter().position(|&b| b == b'\n') {
            Some(pos) => pos,
            None => {
                session.cmd_buf.compact();
                return Ok(());
            }
        };
        let mut line = rem[..pos].to_vec();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        session.cmd_buf.consume(pos + 1);
        handlers::dispatch(session, config, &line)?;
        if session.should_close {
            return Ok(());
        }
    }
}

/// Completes the pending data-path handshake, whichever direction it
/// goes: accept on the passive listener, or resolve the outbound connect.
fn advance_data_connection(session: &mut Session, pasv_readable: bool, data_writable: bool) {
    if session.flags.passive_ready {
        if !pasv_readable {
            return;
        }
        let listener = match session.pasv_listener.as_ref() {
            Some(l) => l,
            None => return,
        };
        match pasv::accept_pasv_connection(listener) {
            Ok(Some(stream)) => {
                session.data = Some(stream);
                // One client per grant; the listener's job is done.
                session.pasv_listener = None;
                session.pasv_addr = None;
                session.state = SessionState::TransferringData;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Passive accept failed: {}", e);
                session.reply(425, &format!("Can't open data connection: {}", e));
                session.enter_idle(true, true);
            }
        }
    } else if session.flags.active_ready {
        if !data_writable {
            return;
        }
        let data = match session.data.as_ref() {
            Some(d) => d,
            None => return,
        };
        match port::connect_result(data) {
            Ok(()) => {
                debug!("Outbound data connection established");
                session.state = SessionState::TransferringData;
            }
            Err(e) => {
                warn!("Outbound data connect failed: {}", e);
                session.reply(425, &format!("Can't open data connection: {}", e));
                session.enter_idle(true, true);
            }
        }
    }
}

/// Steps the active transfer until it blocks or finishes. On completion
/// the closing response is already queued by the step itself.
fn drive_transfer(session: &mut Session) {
    loop {
        let mut transfer = match session.transfer.take() {
            Some(t) => t,
            None => return,
        };
        match transfer.step(session) {
            StepResult::Continue => {
                session.transfer = Some(transfer);
            }
            StepResult::Blocked => {
                session.transfer = Some(transfer);
                return;
            }
            StepResult::Done => {
                if transfer.needs_data_connection() {
                    session.enter_idle(true, true);
                } else {
                    // Control-channel listings never touch the data path;
                    // an armed PASV/PORT grant survives them.
                    session.state = SessionState::AwaitingCommand;
                    session.xfer_buf.clear();
                }
                return;
            }
        }
    }
}
