use std::fs;
use std::io;

use log::{info, warn};

use crate::core_ftpcommand::utils::{require_data_grant, resolve_path};
use crate::core_listing::{format_entry, ListingMode};
use crate::core_path::split_parent;
use crate::core_transfer::{self, ListTransfer, Transfer};
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the LIST FTP command.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - Optional flags and the directory or file to list.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_list_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    begin_listing(session, strip_list_flags(arg), ListingMode::List)
}

/// Handles the NLST FTP command, a bare-names listing.
pub fn handle_nlst_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    begin_listing(session, strip_list_flags(arg), ListingMode::Nlst)
}

/// Handles the MLSD FTP command. Unlike LIST, MLSD of a file is an error.
pub fn handle_mlsd_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    begin_listing(session, arg, ListingMode::Mlsd)
}

// Unix ls clients habitually send "LIST -la"; the flags carry no meaning
// here and are dropped before path resolution.
fn strip_list_flags(arg: &str) -> &str {
    let mut rest = arg;
    while rest.starts_with('-') {
        match rest.split_once(' ') {
            Some((_, tail)) => rest = tail.trim_start(),
            None => return "",
        }
    }
    rest
}

/// Shared entry point for every listing verb, data-channel and
/// control-channel alike.
pub fn begin_listing(
    session: &mut Session,
    arg: &str,
    mode: ListingMode,
) -> Result<(), FtpError> {
    if !mode.over_control() && !require_data_grant(session) {
        return Ok(());
    }

    let virt = if arg.is_empty() {
        session.current_dir.clone()
    } else {
        match resolve_path(session, arg) {
            Some(p) => p,
            None => return Ok(()),
        }
    };

    let real = session.real_path(&virt);
    let md = match fs::metadata(&real) {
        Ok(md) => md,
        Err(e) => {
            session.reply(550, &e.to_string());
            return Ok(());
        }
    };

    let transfer = if md.is_dir() {
        let dir = match fs::read_dir(&real) {
            Ok(dir) => dir,
            Err(e) => {
                warn!("read_dir {} failed: {}", virt, e);
                session.reply(550, &e.to_string());
                return Ok(());
            }
        };
        session.list_dir = virt.clone();
        session.xfer_buf.clear();
        if mode == ListingMode::Mlsd {
            // The current-directory entry leads the MLSD stream.
            let cdir = format_entry(
                mode,
                &session.mlst_facts,
                &virt,
                &virt,
                &md,
                session.last_command_at,
                true,
            );
            if session.xfer_buf.extend(cdir.as_bytes()).is_err() {
                session.reply(451, "Listing line too long.");
                return Ok(());
            }
        }
        Transfer::List(ListTransfer::new_dir(mode, dir, virt))
    } else if mode == ListingMode::Mlsd {
        let e = io::Error::from_raw_os_error(libc::ENOTDIR);
        session.reply(550, &e.to_string());
        return Ok(());
    } else {
        session.list_dir = split_parent(&virt).0.to_string();
        session.xfer_buf.clear();
        Transfer::List(ListTransfer::new_single(mode, virt))
    };

    if mode.over_control() {
        session.reply_open(213, "Status follows:");
    } else {
        info!("Listing {} ({:?})", session.list_dir, mode);
        session.flags.sending = true;
        session.reply(150, "Ready");
    }
    core_transfer::begin(session, transfer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_flags_are_stripped() {
        assert_eq!(strip_list_flags("-la"), "");
        assert_eq!(strip_list_flags("-la saves"), "saves");
        assert_eq!(strip_list_flags("-l -a saves"), "saves");
        assert_eq!(strip_list_flags("saves"), "saves");
        assert_eq!(strip_list_flags(""), "");
    }
}
