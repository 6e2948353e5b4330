//! The transfer engine: one resumable step function per transfer kind.
//!
//! A step is invoked repeatedly, once per event-loop readiness pass, for as
//! long as it reports `Continue`. It moves at most one buffer's worth of
//! data per invocation; a socket that would block defers the rest of the
//! work to the next tick rather than failing.

use std::fs::{self, File, ReadDir};
use std::io::{self, Read, Write};

use log::{debug, warn};

use crate::core_listing::{format_entry, ListingMode};
use crate::core_network::port;
use crate::core_path::split_parent;
use crate::session::{Session, SessionState};

/// Outcome of one step invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Progress was made and more may be possible this tick.
    Continue,
    /// The socket would block; try again next tick.
    Blocked,
    /// The transfer finished (cleanly or not) and its closing response is
    /// queued. The session should return to the command state.
    Done,
}

/// The active transfer, dispatched through a single `step` per variant.
#[derive(Debug)]
pub enum Transfer {
    List(ListTransfer),
    Retrieve(RetrieveTransfer),
    Store(StoreTransfer),
}

impl Transfer {
    pub fn step(&mut self, session: &mut Session) -> StepResult {
        match self {
            Transfer::List(t) => t.step(session),
            Transfer::Retrieve(t) => t.step(session),
            Transfer::Store(t) => t.step(session),
        }
    }

    /// MLST and STAT listings ride the control connection; everything else
    /// needs a negotiated data connection first.
    pub fn needs_data_connection(&self) -> bool {
        match self {
            Transfer::List(t) => !t.mode.over_control(),
            Transfer::Retrieve(_) | Transfer::Store(_) => true,
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Transfer::Store(_))
    }
}

/// Arms `transfer` on the session and arranges the data path.
///
/// With a passive grant the session waits for the event loop to accept the
/// client on the listener; with an active grant a non-blocking connect is
/// issued here and completion is detected on writability. Callers have
/// already verified a grant exists, sent their 150 and opened any file.
pub fn begin(session: &mut Session, transfer: Transfer) {
    if !transfer.needs_data_connection() {
        session.transfer = Some(transfer);
        session.state = SessionState::TransferringData;
        return;
    }

    if session.flags.passive_ready {
        session.transfer = Some(transfer);
        session.state = SessionState::AwaitingDataConnection;
    } else if session.flags.active_ready {
        let addr = match session.peer_addr {
            Some(addr) => addr,
            None => {
                session.reply(425, "Can't open data connection.");
                session.enter_idle(true, true);
                return;
            }
        };
        match port::start_connect(addr) {
            Ok(stream) => {
                debug!("Connecting out to {}", addr);
                session.data = Some(stream);
                session.transfer = Some(transfer);
                session.state = SessionState::AwaitingDataConnection;
            }
            Err(e) => {
                warn!("Failed to start connect to {}: {}", addr, e);
                session.reply(425, &format!("Can't open data connection: {}", e));
                session.enter_idle(true, true);
            }
        }
    } else {
        session.reply(503, "Use PASV or PORT first.");
    }
}

/// Flushes the transfer buffer to the data socket. Returns `None` while
/// bytes may still move this tick, or the step outcome that ends it.
fn drain_to_data(session: &mut Session) -> Option<StepResult> {
    if session.xfer_buf.is_empty() {
        return None;
    }
    let data = match session.data.as_mut() {
        Some(data) => data,
        None => {
            session.reply(426, "Connection closed; transfer aborted.");
            return Some(StepResult::Done);
        }
    };
    match data.write(session.xfer_buf.remaining()) {
        Ok(0) => {
            session.reply(426, "Connection closed; transfer aborted.");
            Some(StepResult::Done)
        }
        Ok(n) => {
            session.xfer_buf.consume(n);
            None
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Some(StepResult::Blocked),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => None,
        Err(e) => {
            session.reply(426, &format!("{}", e));
            Some(StepResult::Done)
        }
    }
}

/// Directory (or single entry) listing in the session's listing mode.
#[derive(Debug)]
pub struct ListTransfer {
    mode: ListingMode,
    dir: Option<ReadDir>,
    /// Virtual path of a single-entry listing (argument named a file).
    single: Option<String>,
    /// The frozen directory the listing iterates.
    dir_virt: String,
    done_reading: bool,
}

impl ListTransfer {
    pub fn new_dir(mode: ListingMode, dir: ReadDir, dir_virt: String) -> Self {
        Self {
            mode,
            dir: Some(dir),
            single: None,
            dir_virt,
            done_reading: false,
        }
    }

    pub fn new_single(mode: ListingMode, virt: String) -> Self {
        let (parent, _) = split_parent(&virt);
        let dir_virt = parent.to_string();
        Self {
            mode,
            dir: None,
            single: Some(virt),
            dir_virt,
            done_reading: false,
        }
    }

    fn step(&mut self, session: &mut Session) -> StepResult {
        if session.xfer_buf.is_empty() && !self.done_reading {
            match self.next_entry(session) {
                Ok(Some(line)) => {
                    if session.xfer_buf.extend(line.as_bytes()).is_err() {
                        session.reply(451, "Listing line too long.");
                        return StepResult::Done;
                    }
                }
                Ok(None) => self.done_reading = true,
                Err(e) => {
                    session.reply(451, &format!("{}", e));
                    return StepResult::Done;
                }
            }
        }

        if self.mode.over_control() {
            // Control output is queued, never blocks.
            let queued = session.xfer_buf.remaining().to_vec();
            session.ctrl_out.extend_from_slice(&queued);
            session.xfer_buf.consume(queued.len());
        } else if let Some(outcome) = drain_to_data(session) {
            return outcome;
        }

        if session.xfer_buf.is_empty() && self.done_reading {
            session.reply(self.mode.final_code(), "OK");
            return StepResult::Done;
        }
        StepResult::Continue
    }

    /// Formats the next entry, or `None` at end of listing. Entries that
    /// vanish between readdir and stat are skipped.
    fn next_entry(&mut self, session: &Session) -> io::Result<Option<String>> {
        let now = session.last_command_at;

        if let Some(virt) = self.single.take() {
            let md = fs::metadata(session.real_path(&virt))?;
            let (_, name) = split_parent(&virt);
            let name = if name.is_empty() { "/" } else { name };
            return Ok(Some(format_entry(
                self.mode,
                &session.mlst_facts,
                &virt,
                name,
                &md,
                now,
                false,
            )));
        }

        let dir = match self.dir.as_mut() {
            Some(dir) => dir,
            None => return Ok(None),
        };
        loop {
            match dir.next() {
                Some(Ok(entry)) => {
                    let name = entry.file_name();
                    let name = name.to_string_lossy();
                    if name == "." || name == ".." {
                        continue;
                    }
                    let md = match entry.metadata() {
                        Ok(md) => md,
                        Err(_) => continue,
                    };
                    let virt = if self.dir_virt == "/" {
                        format!("/{}", name)
                    } else {
                        format!("{}/{}", self.dir_virt, name)
                    };
                    return Ok(Some(format_entry(
                        self.mode,
                        &session.mlst_facts,
                        &virt,
                        &name,
                        &md,
                        now,
                        false,
                    )));
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
    }
}

/// File download: refill from the open file, push to the data socket.
#[derive(Debug)]
pub struct RetrieveTransfer {
    file: File,
}

impl RetrieveTransfer {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    fn step(&mut self, session: &mut Session) -> StepResult {
        if session.xfer_buf.is_empty() {
            match self.file.read(session.xfer_buf.space_mut()) {
                Ok(0) => {
                    session.reply(226, "OK");
                    return StepResult::Done;
                }
                Ok(n) => session.xfer_buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return StepResult::Continue,
                Err(e) => {
                    session.reply(451, &format!("{}", e));
                    return StepResult::Done;
                }
            }
        }
        if let Some(outcome) = drain_to_data(session) {
            return outcome;
        }
        StepResult::Continue
    }
}

/// File upload: refill from the data socket, push to the open file.
/// A zero-length receive is the peer finishing the transfer.
#[derive(Debug)]
pub struct StoreTransfer {
    file: File,
}

impl StoreTransfer {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    fn step(&mut self, session: &mut Session) -> StepResult {
        if session.xfer_buf.is_empty() {
            let data = match session.data.as_mut() {
                Some(data) => data,
                None => {
                    session.reply(426, "Connection closed; transfer aborted.");
                    return StepResult::Done;
                }
            };
            match data.read(session.xfer_buf.space_mut()) {
                Ok(0) => {
                    session.reply(226, "OK");
                    return StepResult::Done;
                }
                Ok(n) => session.xfer_buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return StepResult::Blocked,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return StepResult::Continue,
                Err(e) => {
                    session.reply(426, &format!("{}", e));
                    return StepResult::Done;
                }
            }
        }
        match self.file.write(session.xfer_buf.remaining()) {
            Ok(0) => {
                session.reply(451, "Write returned zero bytes.");
                StepResult::Done
            }
            Ok(n) => {
                session.xfer_buf.consume(n);
                StepResult::Continue
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => StepResult::Continue,
            Err(e) => {
                session.reply(451, &format!("{}", e));
                StepResult::Done
            }
        }
    }
}
