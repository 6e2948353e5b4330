use std::fs::File;
use std::io::{Seek, SeekFrom};

use log::{info, warn};

use crate::core_ftpcommand::utils::{require_data_grant, resolve_path};
use crate::core_transfer::{self, RetrieveTransfer, Transfer};
use crate::error::FtpError;
use crate::session::Session;
use crate::Config;

/// Handles the RETR (Retrieve) FTP command.
///
/// Opens the file, honors a pending REST offset, and arms the download.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The file to download.
///
/// # Returns
///
/// Result<(), FtpError> indicating the success or failure of the operation.
pub fn handle_retr_command(
    session: &mut Session,
    _config: &Config,
    arg: &str,
) -> Result<(), FtpError> {
    if arg.is_empty() {
        session.reply(501, "RETR needs a file name.");
        return Ok(());
    }
    if !require_data_grant(session) {
        return Ok(());
    }
    let virt = match resolve_path(session, arg) {
        Some(p) => p,
        None => return Ok(()),
    };

    let mut file = match File::open(session.real_path(&virt)) {
        Ok(f) => f,
        Err(e) => {
            warn!("RETR {} failed to open: {}", virt, e);
            session.reply(550, &e.to_string());
            return Ok(());
        }
    };
    let offset = session.take_restart_offset();
    if offset > 0 {
        if let Err(e) = file.seek(SeekFrom::Start(offset)) {
            session.reply(550, &e.to_string());
            return Ok(());
        }
    }

    info!("RETR {} (offset {})", virt, offset);
    session.xfer_buf.clear();
    session.flags.sending = true;
    session.reply(150, "Ready");
    core_transfer::begin(session, Transfer::Retrieve(RetrieveTransfer::new(file)));
    Ok(())
}
