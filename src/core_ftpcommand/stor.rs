use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};

use log::{info, warn};

use crate::core_ftpcommand::utils::{require_data_grant, resolve_path};
use crate::core_path::split_parent;
use crate::core_transfer::{self, StoreTransfer, Transfer};
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the STOR (Store) FTP command.
///
/// Creates or truncates the target file; a pending REST offset turns the
/// truncate into an in-place overwrite starting at that offset.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The file to upload to.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_stor_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    begin_store(session, arg, StoreKind::Replace)
}

/// Handles the APPE (Append) FTP command.
pub fn handle_appe_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    begin_store(session, arg, StoreKind::Append)
}

/// Handles the STOU (Store Unique) FTP command.
///
/// Probes `name`, `name.1`, `name.2`, ... until a free name is found and
/// announces the chosen name in the 150 line.
pub fn handle_stou_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if arg.is_empty() {
        session.reply(501, "STOU needs a file name.");
        return Ok(());
    }
    if !require_data_grant(session) {
        return Ok(());
    }
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };

    let mut candidate = virt.clone();
    let mut suffix = 0u32;
    while session.real_path(&candidate).exists() {
        suffix += 1;
        candidate = format!("{}.{}", virt, suffix);
    }

    let file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(session.real_path(&candidate))
    {
        Ok(f) => f,
        Err(e) => {
            warn!("STOU {} failed to open: {}", candidate, e);
            session.reply(550, &e.to_string());
            return Ok(());
        }
    };

    let (_, name) = split_parent(&candidate);
    info!("STOU {}", candidate);
    session.xfer_buf.clear();
    session.flags.receiving = true;
    session.reply_raw(&format!("150 FILE: {}\r\n", name));
    core_transfer::begin(session, Transfer::Store(StoreTransfer::new(file)));
    Ok(())
}

enum StoreKind {
    Replace,
    Append,
}

fn begin_store(session: &mut Session, arg: &str, kind: StoreKind) -> Result<(), FtpError> {
    if arg.is_empty() {
        session.reply(501, "STOR needs a file name.");
        return Ok(());
    }
    if !require_data_grant(session) {
        return Ok(());
    }
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };

    let offset = session.take_restart_offset();
    let file = match open_store(session, &virt, &kind, offset) {
        Ok(f) => f,
        Err(e) => {
            warn!("STOR {} failed to open: {}", virt, e);
            session.reply(550, &e.to_string());
            return Ok(());
        }
    };

    info!("STOR {} (offset {})", virt, offset);
    session.xfer_buf.clear();
    session.flags.receiving = true;
    session.reply(150, "Ready");
    core_transfer::begin(session, Transfer::Store(StoreTransfer::new(file)));
    Ok(())
}

fn open_store(
    session: &Session,
    virt: &str,
    kind: &StoreKind,
    offset: u64,
) -> std::io::Result<File> {
    let real = session.real_path(virt);
    match kind {
        StoreKind::Append => OpenOptions::new().append(true).create(true).open(real),
        StoreKind::Replace if offset > 0 => {
            let mut file = OpenOptions::new().write(true).create(true).open(real)?;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file)
        }
        StoreKind::Replace => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(real),
    }
}
